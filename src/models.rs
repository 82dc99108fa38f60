use crate::schema::users;

#[derive(Insertable, Debug, Clone, PartialEq)]
#[table_name = "users"]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

#[derive(Queryable, Debug, Clone, PartialEq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
}

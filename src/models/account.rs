use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub user_id: i64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Boat {
    pub boat_id: i64,
    pub emblem: String,
}

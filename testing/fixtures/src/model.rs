use rowbind::{Blob, Mapped};
use time::{PrimitiveDateTime, macros::datetime};

///
/// Person
///

#[derive(Clone, Debug, Mapped, PartialEq)]
pub struct Person {
    #[db = "id,primary,auto_increment"]
    pub id: i64,
    pub name: String,
    pub created_at: PrimitiveDateTime,
}

impl Default for Person {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            created_at: datetime!(1970-01-01 0:00),
        }
    }
}

///
/// Audit
///
/// Embedded into records that track who touched them.
///

#[derive(Clone, Debug, Default, Mapped, PartialEq)]
pub struct Audit {
    pub created_by: String,
    pub updated_by: Option<String>,
}

///
/// Review
///

#[derive(Clone, Debug, Default, Mapped, PartialEq)]
pub struct Review {
    pub reviewer: String,
    pub score: i64,
}

///
/// Document
///

#[derive(Clone, Debug, Default, Mapped, PartialEq)]
pub struct Document {
    #[db = "id,primary,auto_increment"]
    pub id: i64,
    pub title: String,
    pub body: Option<String>,
    pub attachment: Blob,
    pub audit: Audit,
    pub review: Option<Review>,
    #[db = "-"]
    pub word_count: usize,
    revision: u32,
}

impl Document {
    #[must_use]
    pub const fn revision(&self) -> u32 {
        self.revision
    }
}

///
/// Membership
///

#[derive(Clone, Debug, Default, Mapped, PartialEq)]
pub struct Membership {
    #[db = "group_id,primary"]
    pub group_id: i64,
    #[db = "user_id,primary"]
    pub user_id: i64,
    pub role: String,
    pub active: bool,
}

///
/// Note
///

#[derive(Clone, Debug, Default, Mapped, PartialEq)]
pub struct Note {
    pub text: String,
    pub extra: Option<String>,
    pub weight: i64,
}

///
/// Noted
///
/// A record whose whole embedded part may be absent.
///

#[derive(Clone, Debug, Default, Mapped, PartialEq)]
pub struct Noted {
    #[db = "id,primary"]
    pub id: i64,
    pub note: Option<Note>,
}

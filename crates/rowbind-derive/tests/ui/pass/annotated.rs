use rowbind_derive::Mapped;

#[derive(Default, Mapped)]
pub struct Person {
    #[db = "id,primary,auto_increment"]
    pub id: i64,
    pub name: String,
    #[db = "-"]
    pub cache: Option<String>,
    #[db = ",primary"]
    pub tenant: i64,
}

fn main() {
    let person = Person::default();
    assert_eq!(person.id, 0);
}

use rowbind::Mapped;

#[derive(Default, Mapped)]
pub struct Audit {
    pub created_by: String,
}

#[derive(Default, Mapped)]
pub struct Document {
    #[db = "doc_id,primary"]
    pub id: i64,
    pub audit: Audit,
    pub stamp: Option<Audit>,
}

fn main() {
    let doc = Document::default();
    assert!(doc.stamp.is_none());
}

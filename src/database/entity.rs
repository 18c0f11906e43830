use rusqlite::{Connection, Row};

/// A base entity persisted in its own table.
///
/// The application owns the base table; the translation store only needs to
/// know how to read and write a row of it. `columns` lists the columns read by
/// `from_row`, in order.
///
/// ```ignore
/// impl BaseEntity for Post {
///     fn table_name() -> &'static str { "posts" }
///     fn columns() -> &'static [&'static str] { &["id", "slug"] }
///     fn id(&self) -> Option<i64> { self.id }
///     fn set_id(&mut self, id: i64) { self.id = Some(id) }
///     fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> { .. }
///     fn insert(&self, conn: &Connection) -> rusqlite::Result<i64> { .. }
///     fn update(&self, conn: &Connection) -> rusqlite::Result<()> { .. }
/// }
/// ```
pub trait BaseEntity: Sized + 'static {
    fn table_name() -> &'static str;

    fn id_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [&'static str];

    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: i64);

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Insert the row and return its new id
    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64>;

    fn update(&self, conn: &Connection) -> rusqlite::Result<()>;
}

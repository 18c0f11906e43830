/*!
 * Common test utilities for the translatable test suite
 */

#![allow(dead_code)]

use anyhow::Result;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use tempfile::TempDir;
use translatable::{
    BaseEntity, DatabaseConnection, Locale, LocaleContext, Translatable, TranslatedRepository,
    TranslationOptions, Translations,
};

translatable::translated_attributes! {
    /// Translated columns of `Post`
    pub enum PostField {
        Title => "title",
        Body => "body",
        Tags => "tags" as serialized,
        Summary => "summary",
    }
}

translatable::translated_attributes! {
    /// Translated columns of `Page`
    pub enum PageField {
        Heading => "heading",
        Content => "content",
    }
}

/// Blog post with strict lookups: missing translations are errors
#[derive(Debug, Clone, Default)]
pub struct Post {
    pub id: Option<i64>,
    pub slug: String,
    pub published: bool,
    pub translations: Translations,
}

impl Post {
    pub fn new(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            ..Self::default()
        }
    }
}

impl BaseEntity for Post {
    fn table_name() -> &'static str {
        "posts"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "slug", "published"]
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            slug: row.get(1)?,
            published: row.get(2)?,
            translations: Translations::new(),
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO posts (slug, published) VALUES (?1, ?2)",
            params![self.slug, self.published],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "UPDATE posts SET slug = ?1, published = ?2 WHERE id = ?3",
            params![self.slug, self.published, self.id],
        )?;
        Ok(())
    }
}

impl Translatable for Post {
    type Attribute = PostField;

    fn translations(&self) -> &Translations {
        &self.translations
    }

    fn translations_mut(&mut self) -> &mut Translations {
        &mut self.translations
    }
}

/// Static page with lenient lookups and custom table naming
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub id: Option<i64>,
    pub name: String,
    pub translations: Translations,
}

impl BaseEntity for Page {
    fn table_name() -> &'static str {
        "pages"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "name"]
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            translations: Translations::new(),
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.execute("INSERT INTO pages (name) VALUES (?1)", [&self.name])?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "UPDATE pages SET name = ?1 WHERE id = ?2",
            params![self.name, self.id],
        )?;
        Ok(())
    }
}

impl Translatable for Page {
    type Attribute = PageField;

    fn translations(&self) -> &Translations {
        &self.translations
    }

    fn translations_mut(&mut self) -> &mut Translations {
        &mut self.translations
    }
}

/// Register `Post` the same way in every test; `Summary` stays unregistered
pub fn register_post() {
    Post::translates(
        &[PostField::Title, PostField::Body, PostField::Tags],
        TranslationOptions::default(),
    )
    .expect("Post registration failed");
}

/// Register `Page` with both fallback policies and explicit table naming
pub fn register_page() {
    let options = TranslationOptions::default()
        .table_name("page_texts")
        .foreign_key("page_ref")
        .fallback_to_empty_on_missing(true)
        .fallbacks_for_empty_translations(true);
    Page::translates(&[PageField::Heading, PageField::Content], options)
        .expect("Page registration failed");
}

/// Create the base tables owned by the test application
pub fn create_base_tables(db: &DatabaseConnection) -> Result<()> {
    db.execute(|conn| {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug TEXT NOT NULL,
                published INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS pages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL
            );",
        )
    })?;
    Ok(())
}

/// Route library logs through the test harness; RUST_LOG picks the level
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// In-memory database with base tables and both translation tables
pub fn setup_database() -> Result<DatabaseConnection> {
    init_logging();
    let db = DatabaseConnection::new_in_memory()?;
    create_base_tables(&db)?;
    register_post();
    register_page();
    TranslatedRepository::<Post>::new(db.clone())?.ensure_schema()?;
    TranslatedRepository::<Page>::new(db.clone())?.ensure_schema()?;
    Ok(db)
}

pub fn post_repository() -> Result<TranslatedRepository<Post>> {
    Ok(TranslatedRepository::new(setup_database()?)?)
}

/// File-backed database in a temporary directory
pub fn setup_file_database(dir: &Path) -> Result<DatabaseConnection> {
    init_logging();
    let db = DatabaseConnection::new(dir.join("store.db"))?;
    create_base_tables(&db)?;
    register_post();
    TranslatedRepository::<Post>::new(db.clone())?.ensure_schema()?;
    Ok(db)
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

pub fn loc(tag: &str) -> Locale {
    Locale::parse(tag).expect("valid locale")
}

pub fn ctx(tag: &str) -> LocaleContext {
    LocaleContext::new(loc(tag))
}

/// Saved post with a title in each given (locale, title) pair
pub fn saved_post(repo: &TranslatedRepository<Post>, slug: &str, titles: &[(&str, &str)]) -> Result<Post> {
    let mut post = Post::new(slug);
    for (locale, title) in titles {
        post.write_attribute_in(&ctx("en"), &loc(locale), PostField::Title, Some(title.to_string()))?;
    }
    repo.save(&mut post)?;
    Ok(post)
}

/*!
 * Tests for saving, loading and deleting translated entities
 */

use translatable::{Translatable, TranslatedRepository, TranslationError};

use crate::common::{
    create_temp_dir, ctx, loc, post_repository, saved_post, setup_database, setup_file_database,
    Page, PageField, Post, PostField,
};

#[test]
fn test_save_thenReload_shouldReturnStoredValue() {
    let repo = post_repository().unwrap();
    let en = ctx("en");
    let mut post = Post::new("hello-world");
    post.write_attribute(&en, PostField::Title, Some("Hello".into())).unwrap();

    repo.save(&mut post).unwrap();
    repo.reload(&mut post).unwrap();

    assert!(post.id.is_some());
    assert_eq!(post.read_attribute(&en, PostField::Title).unwrap().as_deref(), Some("Hello"));
    assert!(!post.translations().has_changes());
}

#[test]
fn test_save_shouldMarkRowsAsPersisted() {
    let repo = post_repository().unwrap();

    let post = saved_post(&repo, "persisted", &[("en", "Hello")]).unwrap();

    let record = post.translations().get(&loc("en")).unwrap();
    assert!(!record.is_new_record());
    assert!(!record.is_changed());
    assert_eq!(record.owner_id, post.id);
    assert!(record.created_at.is_some());
}

#[test]
fn test_save_twiceInSameLocale_shouldUpdateSingleRow() {
    let repo = post_repository().unwrap();
    let en = ctx("en");
    let mut post = saved_post(&repo, "updated", &[("en", "First")]).unwrap();
    let first_id = post.translations().get(&loc("en")).unwrap().id;

    post.write_attribute(&en, PostField::Title, Some("Second".into())).unwrap();
    post.slug = "updated-again".to_string();
    repo.save(&mut post).unwrap();

    let stored = repo.find(post.id.unwrap()).unwrap().unwrap();
    assert_eq!(repo.count_translations(post.id.unwrap()).unwrap(), 1);
    assert_eq!(stored.slug, "updated-again");
    assert_eq!(stored.translations().get(&loc("en")).unwrap().id, first_id);
    assert_eq!(stored.read_attribute(&en, PostField::Title).unwrap().as_deref(), Some("Second"));
}

#[test]
fn test_save_shouldOnlyOverwriteChangedColumns() {
    let repo = post_repository().unwrap();
    let en = ctx("en");
    let mut post = Post::new("partial");
    post.write_attribute(&en, PostField::Title, Some("Title".into())).unwrap();
    post.write_attribute(&en, PostField::Body, Some("Body".into())).unwrap();
    repo.save(&mut post).unwrap();

    let mut copy = repo.find(post.id.unwrap()).unwrap().unwrap();
    copy.write_attribute(&en, PostField::Body, Some("New body".into())).unwrap();
    repo.save(&mut copy).unwrap();
    repo.reload(&mut post).unwrap();

    assert_eq!(post.read_attribute(&en, PostField::Title).unwrap().as_deref(), Some("Title"));
    assert_eq!(post.read_attribute(&en, PostField::Body).unwrap().as_deref(), Some("New body"));
}

#[test]
fn test_save_withSeveralLocales_shouldStoreOneRowPerLocale() {
    let repo = post_repository().unwrap();

    let post = saved_post(&repo, "multi", &[("en", "Hello"), ("fr", "Bonjour"), ("de", "Hallo")]).unwrap();
    let loaded = repo.find(post.id.unwrap()).unwrap().unwrap();

    assert_eq!(repo.count_translations(post.id.unwrap()).unwrap(), 3);
    assert_eq!(loaded.translated_locales(), vec![loc("de"), loc("en"), loc("fr")]);
    let fr = ctx("fr");
    assert_eq!(loaded.read_attribute(&fr, PostField::Title).unwrap().as_deref(), Some("Bonjour"));
}

#[test]
fn test_delete_shouldRemoveAllTranslationRows() {
    let repo = post_repository().unwrap();
    let post = saved_post(&repo, "doomed", &[("en", "Bye"), ("es", "Adiós")]).unwrap();
    let id = post.id.unwrap();
    assert_eq!(repo.count_translations(id).unwrap(), 2);

    assert!(repo.delete(&post).unwrap());

    assert_eq!(repo.count_translations(id).unwrap(), 0);
    assert!(repo.find(id).unwrap().is_none());
    assert!(!repo.delete_by_id(id).unwrap());
}

#[test]
fn test_deleteBaseRowDirectly_shouldCascadeToTranslations() {
    let repo = post_repository().unwrap();
    let post = saved_post(&repo, "cascade", &[("en", "Gone")]).unwrap();
    let id = post.id.unwrap();

    repo.connection()
        .execute(|conn| conn.execute("DELETE FROM posts WHERE id = ?1", [id]))
        .unwrap();

    assert_eq!(repo.count_translations(id).unwrap(), 0);
}

#[test]
fn test_delete_withUnsavedEntity_shouldFailWithNotPersisted() {
    let repo = post_repository().unwrap();
    let mut post = Post::new("draft");

    assert!(matches!(repo.delete(&post), Err(TranslationError::NotPersisted(_))));
    assert!(matches!(repo.reload(&mut post), Err(TranslationError::NotPersisted(_))));
    assert!(matches!(
        repo.save_translations(&mut post),
        Err(TranslationError::NotPersisted(_))
    ));
}

#[test]
fn test_findOrInitByLocale_beforeSave_shouldReturnNewRecord() {
    let repo = post_repository().unwrap();
    let post = Post::new("unsaved");

    let record = repo.find_or_init_by_locale(&post, &loc("it")).unwrap();

    assert!(record.is_new_record());
    assert_eq!(record.locale, loc("it"));
    assert_eq!(record.owner_id, None);
}

#[test]
fn test_findOrInitByLocale_afterSave_shouldReturnStoredRecord() {
    let repo = post_repository().unwrap();
    let post = saved_post(&repo, "stored", &[("it", "Ciao")]).unwrap();

    let first = repo.find_or_init_by_locale(&post, &loc("it")).unwrap();
    let second = repo.find_or_init_by_locale(&post, &loc("it")).unwrap();
    let missing = repo.find_or_init_by_locale(&post, &loc("ja")).unwrap();

    assert!(!first.is_new_record());
    assert_eq!(first.get("title"), Some("Ciao"));
    assert_eq!(first.id, second.id);
    assert!(missing.is_new_record());
    assert_eq!(missing.owner_id, post.id);
    assert_eq!(repo.count_translations(post.id.unwrap()).unwrap(), 1);
}

#[test]
fn test_findOrInitByLocale_inMemoryCollection_shouldReuseRecord() {
    let mut post = Post::new("memory");

    post.translations_mut().find_or_init_by_locale(&loc("nl")).set("title", Some("Hallo".into()));
    let again = post.translations_mut().find_or_init_by_locale(&loc("nl"));

    assert_eq!(again.get("title"), Some("Hallo"));
    assert_eq!(post.translations().len(), 1);
}

#[test]
fn test_reload_shouldDiscardStagedEdits() {
    let repo = post_repository().unwrap();
    let en = ctx("en");
    let mut post = saved_post(&repo, "staged", &[("en", "Saved")]).unwrap();

    post.write_attribute(&en, PostField::Title, Some("Unsaved".into())).unwrap();
    post.write_attribute_in(&en, &loc("fr"), PostField::Title, Some("Pas sauvé".into())).unwrap();
    repo.reload(&mut post).unwrap();

    assert_eq!(post.read_attribute(&en, PostField::Title).unwrap().as_deref(), Some("Saved"));
    assert_eq!(post.translated_locales(), vec![loc("en")]);
}

#[test]
fn test_findAll_shouldLoadTranslationsOfEveryEntity() {
    let repo = post_repository().unwrap();
    saved_post(&repo, "one", &[("en", "One")]).unwrap();
    saved_post(&repo, "two", &[("en", "Two"), ("fr", "Deux")]).unwrap();

    let posts = repo.find_all().unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].slug, "one");
    assert_eq!(posts[1].translations().len(), 2);
}

#[test]
fn test_serializedAttribute_shouldSurviveSaveAndReload() {
    let repo = post_repository().unwrap();
    let en = ctx("en");
    let mut post = Post::new("tagged");
    let tags = vec!["rust".to_string(), "i18n".to_string()];
    post.write_attribute(&en, PostField::Title, Some("Tagged".into())).unwrap();
    post.write_serialized(&en, PostField::Tags, &tags).unwrap();

    repo.save(&mut post).unwrap();
    let loaded = repo.find(post.id.unwrap()).unwrap().unwrap();

    let read: Option<Vec<String>> = loaded.read_serialized(&en, PostField::Tags).unwrap();
    assert_eq!(read, Some(tags));
}

#[test]
fn test_savedEntity_withStrictLookup_shouldFailForMissingLocale() {
    let repo = post_repository().unwrap();
    let post = saved_post(&repo, "strict", &[("en", "Only English")]).unwrap();
    let loaded = repo.find(post.id.unwrap()).unwrap().unwrap();

    let error = loaded.read_attribute(&ctx("ko"), PostField::Title).unwrap_err();

    assert!(error.is_lookup());
}

#[test]
fn test_pageWithLenientPolicies_shouldFallBackPastEmptyValues() {
    let db = setup_database().unwrap();
    let repo = TranslatedRepository::<Page>::new(db).unwrap();
    let mut page = Page {
        name: "about".to_string(),
        ..Page::default()
    };
    page.write_attribute_in(&ctx("en"), &loc("de"), PageField::Heading, Some(String::new())).unwrap();
    page.write_attribute_in(&ctx("en"), &loc("en"), PageField::Heading, Some("About us".into())).unwrap();
    repo.save(&mut page).unwrap();

    let loaded = repo.find(page.id.unwrap()).unwrap().unwrap();
    let de = ctx("de").with_fallbacks(loc("de"), vec![loc("en")]);

    assert_eq!(loaded.read_attribute(&de, PageField::Heading).unwrap().as_deref(), Some("About us"));
    assert_eq!(loaded.read_attribute(&ctx("ja"), PageField::Content).unwrap(), None);
}

#[test]
fn test_save_withFailingTranslationWrite_shouldRollBackBaseRow() {
    let db = setup_database().unwrap();
    let repo = TranslatedRepository::<Page>::new(db.clone()).unwrap();
    db.execute(|conn| conn.execute_batch("DROP TABLE page_texts")).unwrap();
    let mut page = Page {
        name: "rolled-back".to_string(),
        ..Page::default()
    };
    page.write_attribute_in(&ctx("en"), &loc("en"), PageField::Heading, Some("Lost".into())).unwrap();

    let result = repo.save(&mut page);

    assert!(matches!(result, Err(TranslationError::Database(_))));
    assert_eq!(page.id, None);
    let pages: i64 = db
        .execute(|conn| conn.query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0)))
        .unwrap();
    assert_eq!(pages, 0);
    assert!(page.translations().has_changes());
}

#[test]
fn test_fileDatabase_reopened_shouldKeepTranslations() {
    let dir = create_temp_dir().unwrap();
    let id = {
        let db = setup_file_database(dir.path()).unwrap();
        let repo = TranslatedRepository::<Post>::new(db).unwrap();
        saved_post(&repo, "durable", &[("sv", "Hej")]).unwrap().id.unwrap()
    };

    let db = setup_file_database(dir.path()).unwrap();
    let repo = TranslatedRepository::<Post>::new(db).unwrap();
    let post = repo.find(id).unwrap().unwrap();

    assert_eq!(post.read_attribute(&ctx("sv"), PostField::Title).unwrap().as_deref(), Some("Hej"));
}

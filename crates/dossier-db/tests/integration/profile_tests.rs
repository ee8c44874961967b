use chrono::{TimeDelta, Utc};
use dossier_core::cache::ProfileCache;
use dossier_core::models::{Experience, Position, ProfileRecord};
use dossier_db::{Database, ProfileRepository};

use crate::integration::common::setup_test_db;

const IDENTITY: &str = "me@example.com";
const PROFILE_URL: &str = "https://www.linkedin.com/in/jane-doe/";

fn jane() -> ProfileRecord {
    ProfileRecord {
        job_title: Some("Staff Engineer".into()),
        profile_url: Some(PROFILE_URL.into()),
        experiences: vec![Experience {
            company_name: Some("Acme Corp".into()),
            positions: vec![Position::titled("Engineer")],
            ..Default::default()
        }],
        education: vec!["State University".into()],
        ..ProfileRecord::new("Jane Doe")
    }
}

#[tokio::test]
async fn save_and_load_under_every_key() {
    let (pool, _container) = setup_test_db().await;
    let repo = ProfileRepository::new(pool);
    let keys = vec![IDENTITY.to_string(), PROFILE_URL.to_string()];

    repo.save(&keys, &jane(), "hash-1").await.unwrap();

    for key in &keys {
        let cached = repo.load(key).await.unwrap().expect("snapshot stored");
        assert_eq!(cached.profile, jane());
        assert_eq!(cached.data_hash, "hash-1");
        assert!(cached.updated_at > Utc::now() - TimeDelta::minutes(1));
    }
    assert!(repo.load("someone-else").await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_is_last_write_wins() {
    let (pool, _container) = setup_test_db().await;
    let repo = ProfileRepository::new(pool);
    let keys = vec![IDENTITY.to_string()];

    repo.save(&keys, &jane(), "hash-1").await.unwrap();
    let first = repo.load(IDENTITY).await.unwrap().unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    let renamed = ProfileRecord {
        full_name: "Jane Q. Doe".into(),
        ..jane()
    };
    repo.save(&keys, &renamed, "hash-2").await.unwrap();
    let second = repo.load(IDENTITY).await.unwrap().unwrap();

    assert_eq!(second.profile.full_name, "Jane Q. Doe");
    assert_eq!(second.data_hash, "hash-2");
    assert!(second.updated_at > first.updated_at);
}

#[tokio::test]
async fn remove_and_purge() {
    let (pool, _container) = setup_test_db().await;
    let repo = ProfileRepository::new(pool);

    repo.save(&[IDENTITY.to_string(), PROFILE_URL.to_string()], &jane(), "h")
        .await
        .unwrap();

    assert_eq!(repo.remove(IDENTITY).await.unwrap(), 2);
    assert_eq!(repo.remove(IDENTITY).await.unwrap(), 0);
    assert!(repo.load(PROFILE_URL).await.unwrap().is_none());

    repo.save(&[PROFILE_URL.to_string()], &jane(), "h")
        .await
        .unwrap();
    let purged = repo
        .purge_older_than(Utc::now() + TimeDelta::minutes(1))
        .await
        .unwrap();
    assert_eq!(purged, 1);
    assert!(repo.load(PROFILE_URL).await.unwrap().is_none());
}

#[tokio::test]
async fn evict_by_url_leaves_other_profiles() {
    let (pool, _container) = setup_test_db().await;
    let cache = ProfileCache::new(ProfileRepository::new(pool), TimeDelta::days(1));
    let john = ProfileRecord {
        profile_url: Some("https://www.linkedin.com/in/john-roe/".into()),
        ..ProfileRecord::new("John Roe")
    };

    cache
        .store(&[IDENTITY.to_string(), PROFILE_URL.to_string()], &jane())
        .await
        .unwrap();
    cache.store(&["john@example.com".to_string()], &john).await.unwrap();

    assert_eq!(cache.evict(PROFILE_URL).await.unwrap(), 2);
    assert_eq!(cache.lookup(IDENTITY).await.unwrap(), None);
    assert_eq!(cache.lookup("john@example.com").await.unwrap(), Some(john));
}

#[tokio::test]
async fn health_check_and_repository_factory() {
    let (pool, _container) = setup_test_db().await;
    let db = Database::from_pool(pool);

    db.health_check().await.unwrap();
    db.profile_repo()
        .save(&[IDENTITY.to_string()], &jane(), "h")
        .await
        .unwrap();
    assert!(db.profile_repo().load(IDENTITY).await.unwrap().is_some());
}

#[tokio::test]
async fn cache_freshness_over_postgres() {
    let (pool, _container) = setup_test_db().await;
    let cache = ProfileCache::new(ProfileRepository::new(pool), TimeDelta::days(1));

    cache.store(&[IDENTITY.to_string()], &jane()).await.unwrap();

    let hit = cache.lookup(IDENTITY).await.unwrap();
    assert_eq!(hit, Some(jane()));

    // two days later the same snapshot is stale
    let later = Utc::now() + TimeDelta::days(2);
    assert_eq!(cache.lookup_at(IDENTITY, later).await.unwrap(), None);
}

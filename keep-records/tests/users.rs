use std::sync::Arc;

use keep_core::{
    ErrorKind, MemoryRepository, MemoryStore, PageRequest, Patch, RequestContext,
};
use keep_records::{Address, AddressPatch, NewUser, User, UserPatch, UsersService};

fn service() -> (UsersService, MemoryStore) {
    let store = MemoryStore::new();
    let repo = MemoryRepository::<User>::new(store.clone(), "users");
    (UsersService::new(Arc::new(repo)), store)
}

fn ada() -> NewUser {
    NewUser {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        phone: "0700".to_string(),
        address: Address {
            building_number: "12".to_string(),
            street: "St James's Square".to_string(),
            city: "London".to_string(),
            post_code: "SW1Y".to_string(),
            country: "UK".to_string(),
        },
        firebase_id: "fb-ada".to_string(),
    }
}

#[tokio::test]
async fn create_assigns_id_and_timestamps() {
    let (users, _) = service();
    let ctx = RequestContext::new();

    let created = users.create(&ctx, ada()).await.unwrap();
    assert!(!created.id.is_empty());
    assert!(created.created_at.is_some());
    assert_eq!(created.created_at, created.updated_at);

    let fetched = users.get_by_id(&ctx, &created.id).await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn missing_user_is_not_found() {
    let (users, _) = service();
    let err = users.get_by_id(&RequestContext::new(), "nope").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(err.message.starts_with("failed to get user by ID"));
}

#[tokio::test]
async fn external_id_lookup_finds_the_linked_user() {
    let (users, _) = service();
    let ctx = RequestContext::new();
    let created = users.create(&ctx, ada()).await.unwrap();
    users
        .create(&ctx, NewUser { firebase_id: "fb-other".to_string(), ..NewUser::default() })
        .await
        .unwrap();

    let found = users.get_by_external_id(&ctx, "fb-ada").await.unwrap();
    assert_eq!(found.id, created.id);

    let err = users.get_by_external_id(&ctx, "fb-nobody").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.message, "user not found");
}

#[tokio::test]
async fn blank_external_id_does_not_match_unlinked_users() {
    let (users, _) = service();
    let ctx = RequestContext::new();
    users.create(&ctx, NewUser::default()).await.unwrap();

    for blank in ["", "   "] {
        let err = users.get_by_external_id(&ctx, blank).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }
}

#[tokio::test]
async fn phone_only_update_writes_phone_and_updated_at() {
    let (users, store) = service();
    let ctx = RequestContext::new();
    let created = users.create(&ctx, ada()).await.unwrap();
    let before = store.raw("users", &created.id).await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let sparse = User {
        phone: "0123".to_string(),
        ..User::default()
    };
    let updated = users
        .update(&ctx, &created.id, &UserPatch::from_sparse(&sparse))
        .await
        .unwrap();

    assert_eq!(updated.phone, "0123");
    assert!(updated.updated_at > created.updated_at);

    let after = store.raw("users", &created.id).await.unwrap();
    let changed: Vec<_> = after
        .as_object()
        .unwrap()
        .iter()
        .filter(|(key, value)| before.get(key.as_str()) != Some(value))
        .map(|(key, _)| key.as_str())
        .collect();
    assert_eq!(changed, vec!["phone", "updated_at"]);
}

#[tokio::test]
async fn nested_address_update_keeps_sibling_fields() {
    let (users, _) = service();
    let ctx = RequestContext::new();
    let created = users.create(&ctx, ada()).await.unwrap();

    let patch = UserPatch {
        address: AddressPatch {
            city: Patch::Set("Leeds".to_string()),
            ..AddressPatch::default()
        },
        ..UserPatch::default()
    };
    let updated = users.update(&ctx, &created.id, &patch).await.unwrap();

    assert_eq!(updated.address.city, "Leeds");
    assert_eq!(updated.address.street, "St James's Square");
    assert_eq!(updated.address.post_code, "SW1Y");
}

#[tokio::test]
async fn cleared_field_is_written_empty() {
    let (users, _) = service();
    let ctx = RequestContext::new();
    let created = users.create(&ctx, ada()).await.unwrap();

    let patch = UserPatch {
        email: Patch::Clear,
        ..UserPatch::default()
    };
    let updated = users.update(&ctx, &created.id, &patch).await.unwrap();
    assert_eq!(updated.email, "");
    assert_eq!(updated.phone, "0700");
}

#[tokio::test]
async fn empty_patch_returns_current_record_without_writing() {
    let (users, _) = service();
    let ctx = RequestContext::new();
    let created = users.create(&ctx, ada()).await.unwrap();

    let same = users
        .update(&ctx, &created.id, &UserPatch::default())
        .await
        .unwrap();
    assert_eq!(same, created);
}

#[tokio::test]
async fn update_of_missing_user_is_not_found() {
    let (users, store) = service();
    let patch = UserPatch {
        phone: Patch::Set("0123".to_string()),
        ..UserPatch::default()
    };

    let err = users
        .update(&RequestContext::new(), "ghost", &patch)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(store.count("users").await, 0);
}

#[tokio::test]
async fn list_pages_through_every_user() {
    let (users, _) = service();
    let ctx = RequestContext::new();
    for _ in 0..5 {
        users.create(&ctx, ada()).await.unwrap();
    }

    let mut seen = Vec::new();
    let mut request = PageRequest::first(2);
    loop {
        let page = users.list(&ctx, request.clone()).await.unwrap();
        seen.extend(page.items.iter().map(|u| u.id.clone()));
        match request.next(&page) {
            Some(next) => request = next,
            None => break,
        }
    }

    let all = users.list(&ctx, PageRequest::unlimited()).await.unwrap();
    let ids: Vec<_> = all.items.into_iter().map(|u| u.id).collect();
    assert_eq!(seen, ids);
}

#[tokio::test]
async fn delete_is_not_found_the_second_time() {
    let (users, _) = service();
    let ctx = RequestContext::new();
    let created = users.create(&ctx, ada()).await.unwrap();

    users.delete(&ctx, &created.id).await.unwrap();
    let err = users.delete(&ctx, &created.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

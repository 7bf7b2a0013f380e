// PgStore conformance: the same invariants the in-memory store is unit-tested
// for, checked against a real PostgreSQL. Skips when DATABASE_URL is unset.
mod common;

use anyhow::Result;
use common::{pg_state, pg_user};
use contact_api::database::models::{ContactFilter, NewTag};
use contact_api::database::DatabaseError;
use contact_api::services::{BulkLinkInput, ContactInput, ServiceError, TagInput};
use contact_api::state::AppState;
use uuid::Uuid;

macro_rules! pg_or_skip {
    () => {
        match pg_state().await? {
            Some(state) => state,
            None => return Ok(()),
        }
    };
}

async fn contact(state: &AppState, owner: Uuid, name: &str) -> Result<Uuid> {
    let input = ContactInput {
        name: Some(name.to_string()),
        email: Some(format!("{}@example.com", name.to_lowercase())),
        phone: Some("555-0100".to_string()),
        is_favorite: None,
    };
    Ok(state.contacts.create(owner, input).await?.id)
}

async fn tag(state: &AppState, owner: Uuid, name: &str) -> Result<Uuid> {
    let input = TagInput {
        name: Some(name.to_string()),
        color: None,
    };
    Ok(state.tags.create(owner, input).await?.id)
}

async fn usage(state: &AppState, owner: Uuid, tag_id: Uuid) -> Result<i64> {
    Ok(state.tags.owned(owner, tag_id).await?.usage_count)
}

#[tokio::test]
async fn tag_names_are_unique_per_owner_ignoring_case() -> Result<()> {
    let state = pg_or_skip!();
    let ada = pg_user(&state, "ada").await?;
    let bob = pg_user(&state, "bob").await?;

    tag(&state, ada, "Work").await?;
    let err = state
        .tags
        .create(ada, TagInput { name: Some("WORK".to_string()), color: None })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateTag(_)));

    // The unique index rejects what slips past the service check
    let err = state
        .store
        .insert_tag(NewTag {
            created_by: ada,
            name: "wOrK".to_string(),
            color: "#3498db".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::Conflict(_)));

    tag(&state, bob, "work").await?;
    Ok(())
}

#[tokio::test]
async fn lists_keep_their_order() -> Result<()> {
    let state = pg_or_skip!();
    let owner = pg_user(&state, "ada").await?;
    let a = contact(&state, owner, "A").await?;
    let b = contact(&state, owner, "B").await?;
    let c = contact(&state, owner, "C").await?;

    let listed: Vec<Uuid> = state.contacts.list(owner).await?.iter().map(|v| v.id).collect();
    assert_eq!(listed, vec![a, b, c]);

    let rare = tag(&state, owner, "Rare").await?;
    let common = tag(&state, owner, "Common").await?;
    state.associations.link(owner, common, a).await?;
    state.associations.link(owner, common, b).await?;
    state.associations.link(owner, rare, c).await?;

    let tags: Vec<Uuid> = state.tags.list(owner).await?.iter().map(|t| t.id).collect();
    assert_eq!(tags, vec![common, rare]);

    // Tag summaries come back in attachment order
    state.associations.link(owner, rare, a).await?;
    let view = state.contacts.list(owner).await?.into_iter().find(|v| v.id == a).unwrap();
    assert_eq!(view.tag_ids(), vec![common, rare]);
    Ok(())
}

#[tokio::test]
async fn link_unlink_and_bulk_keep_usage_exact() -> Result<()> {
    let state = pg_or_skip!();
    let owner = pg_user(&state, "ada").await?;
    let team = tag(&state, owner, "Team").await?;
    let a = contact(&state, owner, "A").await?;
    let b = contact(&state, owner, "B").await?;

    state.associations.link(owner, team, b).await?;
    assert!(matches!(
        state.associations.link(owner, team, b).await,
        Err(ServiceError::AlreadyAssigned)
    ));
    assert_eq!(usage(&state, owner, team).await?, 1);

    let input = BulkLinkInput {
        contact_ids: Some(vec![a.to_string(), b.to_string(), b.to_string(), Uuid::new_v4().to_string()]),
    };
    let report = state.associations.bulk_link(owner, team, input).await?;
    assert_eq!(report.total_processed, 2);
    assert_eq!(report.added_count, 1);
    assert_eq!(report.tag.usage_count, 2);

    state.associations.unlink(owner, team, a).await?;
    assert!(matches!(
        state.associations.unlink(owner, team, a).await,
        Err(ServiceError::NotAssigned)
    ));
    assert_eq!(usage(&state, owner, team).await?, 1);

    let without = state.store.list_contacts(owner, ContactFilter::WithoutTag(team)).await?;
    assert_eq!(without.iter().map(|c| c.id).collect::<Vec<_>>(), vec![a]);
    Ok(())
}

#[tokio::test]
async fn tag_delete_strips_every_contact() -> Result<()> {
    let state = pg_or_skip!();
    let owner = pg_user(&state, "ada").await?;
    let team = tag(&state, owner, "Team").await?;
    let keep = tag(&state, owner, "Keep").await?;
    let mut ids = Vec::new();
    for name in ["A", "B", "C"] {
        let id = contact(&state, owner, name).await?;
        state.associations.link(owner, team, id).await?;
        state.associations.link(owner, keep, id).await?;
        ids.push(id);
    }

    let deletion = state.tags.delete(owner, team).await?;
    assert_eq!(deletion.detached_contacts, 3);

    for id in ids {
        let stored = state.store.find_contact(owner, id).await?.unwrap();
        assert_eq!(stored.tags, vec![keep]);
    }
    assert!(matches!(state.tags.owned(owner, team).await, Err(ServiceError::TagNotFound)));
    assert_eq!(usage(&state, owner, keep).await?, 3);
    Ok(())
}

#[tokio::test]
async fn contact_delete_releases_tags() -> Result<()> {
    let state = pg_or_skip!();
    let owner = pg_user(&state, "ada").await?;
    let team = tag(&state, owner, "Team").await?;
    let a = contact(&state, owner, "A").await?;
    state.associations.link(owner, team, a).await?;
    assert_eq!(usage(&state, owner, team).await?, 1);

    state.contacts.delete(owner, a).await?;
    assert_eq!(usage(&state, owner, team).await?, 0);

    // A link arriving after the delete reports the missing contact
    assert!(state.store.attach_tag(owner, team, &[a]).await?.is_empty());
    assert!(matches!(
        state.associations.link(owner, team, a).await,
        Err(ServiceError::ContactNotFound)
    ));
    assert_eq!(usage(&state, owner, team).await?, 0);
    Ok(())
}

#[tokio::test]
async fn concurrent_link_and_delete_never_fail_internally() -> Result<()> {
    let state = pg_or_skip!();
    let owner = pg_user(&state, "ada").await?;
    let team = tag(&state, owner, "Team").await?;

    let mut tasks = Vec::new();
    for i in 0..20 {
        let id = contact(&state, owner, &format!("C{}", i)).await?;
        let linker = state.clone();
        let deleter = state.clone();
        tasks.push(tokio::spawn(async move { linker.associations.link(owner, team, id).await.err() }));
        tasks.push(tokio::spawn(async move { deleter.contacts.delete(owner, id).await.err() }));
    }

    for task in tasks {
        if let Some(err) = task.await? {
            assert!(matches!(err, ServiceError::ContactNotFound), "unexpected error: {}", err);
        }
    }
    assert_eq!(usage(&state, owner, team).await?, 0);
    Ok(())
}

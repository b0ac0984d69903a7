//! End-to-end tests: write, announce, replicate, project

use bytes::Bytes;
use weft_log::{
    Announcement, Author, BlobStore, ContentId, Envelope, Identity, Keypair, LogStore,
    MemoryBlobStore,
    MemoryTransport, Operation, RecoverVerifier, Replicator, Subscription, Transport,
    outbox_topic,
};

#[tokio::test]
async fn profile_scenario_username_bio_following() {
    // Root sets username "a"; child sets bio "b"; grandchild follows "u1".
    let blobs = MemoryBlobStore::new();
    let mut author = Author::new(Keypair::generate(), blobs.clone());

    author
        .append_at(Operation::SetUsername { username: "a".into() }, 1)
        .await
        .unwrap();
    author
        .append_at(Operation::SetBio { bio: "b".into() }, 2)
        .await
        .unwrap();
    let head = author
        .append_at(
            Operation::AddFollowing {
                following_id: Identity::new("u1"),
            },
            3,
        )
        .await
        .unwrap();

    let mut replica = LogStore::new(author.identity());
    Replicator::new(blobs).sync(&mut replica, &head).await.unwrap();

    let profile = replica.profile_state();
    assert_eq!(profile.username, "a");
    assert_eq!(profile.bio, "b");
    assert_eq!(profile.following, vec![Identity::new("u1")]);
}

#[tokio::test]
async fn timeline_scenario_add_two_remove_one() {
    let blobs = MemoryBlobStore::new();
    let mut author = Author::new(Keypair::generate(), blobs.clone());

    author
        .append_at(
            Operation::AddNote {
                note_ref: ContentId::new("n1"),
            },
            1,
        )
        .await
        .unwrap();
    author
        .append_at(
            Operation::AddNote {
                note_ref: ContentId::new("n2"),
            },
            2,
        )
        .await
        .unwrap();
    let head = author
        .append_at(
            Operation::RemoveNote {
                note_ref: ContentId::new("n1"),
            },
            3,
        )
        .await
        .unwrap();

    let mut replica = LogStore::new(author.identity());
    Replicator::new(blobs).sync(&mut replica, &head).await.unwrap();

    assert_eq!(replica.timeline_state().notes, vec![ContentId::new("n2")]);
}

#[tokio::test]
async fn mixed_log_feeds_both_projections_from_one_pass() {
    let blobs = MemoryBlobStore::new();
    let mut author = Author::new(Keypair::generate(), blobs.clone());

    author
        .append_at(Operation::SetUsername { username: "alice".into() }, 1)
        .await
        .unwrap();
    author
        .append_at(
            Operation::AddNote {
                note_ref: ContentId::new("n1"),
            },
            2,
        )
        .await
        .unwrap();
    let head = author
        .append_at(Operation::SetBio { bio: "weaver".into() }, 3)
        .await
        .unwrap();

    let mut replica = LogStore::new(author.identity());
    Replicator::new(blobs).sync(&mut replica, &head).await.unwrap();

    assert_eq!(replica.profile_state().username, "alice");
    assert_eq!(replica.profile_state().bio, "weaver");
    assert_eq!(replica.timeline_state().notes, vec![ContentId::new("n1")]);
}

#[tokio::test]
async fn announce_then_follow_over_the_transport() {
    let blobs = MemoryBlobStore::new();
    let transport = MemoryTransport::new();
    let mut author = Author::new(Keypair::generate(), blobs.clone());

    // Follower subscribes to the author's outbox before any announcement
    let mut inbox = transport
        .subscribe(&outbox_topic(&author.identity()))
        .await
        .unwrap();

    author
        .append_at(Operation::SetUsername { username: "alice".into() }, 1)
        .await
        .unwrap();
    author.announce(&transport).await.unwrap();

    let payload = inbox.next().await.unwrap();
    let envelope = Envelope::from_bytes(&payload).unwrap();
    assert!(envelope.is_authenticated(&RecoverVerifier));

    let announcement = envelope.announcement().unwrap();
    let mut replica = LogStore::new(author.identity());
    Replicator::new(blobs)
        .sync(&mut replica, announcement.block())
        .await
        .unwrap();

    assert_eq!(replica.profile_state().username, "alice");
}

#[tokio::test]
async fn overlapping_announcements_converge_without_refetching() {
    let blobs = MemoryBlobStore::new();
    let mut author = Author::new(Keypair::generate(), blobs.clone());

    let mid = author
        .append_at(Operation::SetBio { bio: "one".into() }, 1)
        .await
        .unwrap();
    let head = author
        .append_at(Operation::SetBio { bio: "two".into() }, 2)
        .await
        .unwrap();

    let replicator = Replicator::new(blobs);
    let mut replica = LogStore::new(author.identity());

    // A stale announcement arrives first, then the current one
    let first = replicator.sync(&mut replica, &mid).await.unwrap();
    assert_eq!(first.fetched, 1);
    let second = replicator.sync(&mut replica, &head).await.unwrap();
    assert_eq!(second.fetched, 1);

    // Replaying either announcement is a no-op
    assert_eq!(replicator.sync(&mut replica, &head).await.unwrap().fetched, 0);
    assert_eq!(replicator.sync(&mut replica, &mid).await.unwrap().fetched, 0);
    assert_eq!(replica.len(), 2);
    assert_eq!(replica.profile_state().bio, "two");
}

#[tokio::test]
async fn forked_log_replays_identically_on_every_peer() {
    // Two blocks signed on the same parent (a concurrently-signed fork).
    let blobs = MemoryBlobStore::new();
    let key = Keypair::generate();
    let mut author = Author::new(key.clone(), blobs.clone());
    let root = author
        .append_at(Operation::SetUsername { username: "orig".into() }, 1)
        .await
        .unwrap();

    let fork_a = weft_log::Block::new(
        Some(root.clone()),
        10,
        key.identity(),
        Operation::SetBio { bio: "fork a".into() },
    )
    .sign(&key)
    .unwrap();
    let fork_a_id = blobs.put(&fork_a.to_cbor().unwrap()).await.unwrap();

    let fork_b = weft_log::Block::new(
        Some(root.clone()),
        20,
        key.identity(),
        Operation::SetBio { bio: "fork b".into() },
    )
    .sign(&key)
    .unwrap();
    let fork_b_id = blobs.put(&fork_b.to_cbor().unwrap()).await.unwrap();

    let replicator = Replicator::new(blobs);

    // Peer one hears about fork A first; peer two hears about fork B first.
    let mut peer_one = LogStore::new(key.identity());
    replicator.sync(&mut peer_one, &fork_a_id).await.unwrap();
    replicator.sync(&mut peer_one, &fork_b_id).await.unwrap();

    let mut peer_two = LogStore::new(key.identity());
    replicator.sync(&mut peer_two, &fork_b_id).await.unwrap();
    replicator.sync(&mut peer_two, &fork_a_id).await.unwrap();

    // Sibling order is by timestamp, not arrival: both peers fold "fork b"
    // last and agree on the projected state.
    assert_eq!(peer_one.profile_state(), peer_two.profile_state());
    assert_eq!(peer_one.profile_state().bio, "fork b");

    let line_one: Vec<_> = peer_one.line().iter().map(|(id, _)| (*id).clone()).collect();
    let line_two: Vec<_> = peer_two.line().iter().map(|(id, _)| (*id).clone()).collect();
    assert_eq!(line_one, line_two);
}

#[tokio::test]
async fn projections_are_pure_between_appends() {
    let blobs = MemoryBlobStore::new();
    let mut author = Author::new(Keypair::generate(), blobs.clone());
    let head = author
        .append_at(Operation::SetUsername { username: "alice".into() }, 1)
        .await
        .unwrap();

    let mut replica = LogStore::new(author.identity());
    Replicator::new(blobs).sync(&mut replica, &head).await.unwrap();

    assert_eq!(replica.profile_state(), replica.profile_state());
    assert_eq!(replica.timeline_state(), replica.timeline_state());
}

#[tokio::test]
async fn freshly_followed_identity_projects_default_state() {
    // A follower may project before any block has replicated.
    let replica = LogStore::new(Identity::new("0xnobody"));
    assert_eq!(replica.profile_state(), weft_log::ProfileState::default());
    assert_eq!(replica.timeline_state(), weft_log::TimelineState::default());
}

#[tokio::test]
async fn corrupted_blob_bytes_surface_as_an_error() {
    let blobs = MemoryBlobStore::new();
    let garbage = blobs.put(b"not a block").await.unwrap();

    let mut replica = LogStore::new(Identity::new("0xsomeone"));
    let err = Replicator::new(blobs).sync(&mut replica, &garbage).await;
    assert!(err.is_err());
    assert!(replica.is_empty());
}

#[tokio::test]
async fn unsigned_envelope_still_carries_a_usable_announcement() {
    let announcement = Announcement::update(ContentId::new("bafy-head"), 7);
    let bytes = Envelope::plain(&announcement).unwrap().to_bytes().unwrap();

    let envelope = Envelope::from_bytes(&bytes).unwrap();
    assert!(!envelope.is_authenticated(&RecoverVerifier));
    assert_eq!(envelope.announcement().unwrap(), announcement);
}

#[tokio::test]
async fn transport_payloads_are_opaque_bytes() {
    // The transport must not care what is published on a topic.
    let transport = MemoryTransport::new();
    let mut sub = transport.subscribe("outbox/0xraw").await.unwrap();
    transport
        .publish("outbox/0xraw", Bytes::from_static(b"\x00\x01\x02"))
        .await
        .unwrap();
    assert_eq!(sub.next().await.as_deref(), Some(&b"\x00\x01\x02"[..]));
}

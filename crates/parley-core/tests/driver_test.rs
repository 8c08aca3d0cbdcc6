//! Hub driver behavior tests
//!
//! Join, relay and leave sequences driven through `HubDriver` the way the
//! runtime drives it.

use parley_core::{
    AddressKey, ConnectionId, DriverConfig, HubAction, HubDriver, HubError, HubEvent,
    IdentityKey, IdentityScheme, NameUpdate, Outbound, Payload, RenameRequest, RoomToken,
};

fn id(n: u64) -> ConnectionId {
    ConnectionId::new(n)
}

fn connect(driver: &mut HubDriver, n: u64, remote: &str) -> Vec<HubAction> {
    driver
        .process_event(HubEvent::Connected {
            connection_id: id(n),
            remote_addr: remote.to_string(),
            path: "/ws".to_string(),
        })
        .unwrap()
}

fn rename(driver: &mut HubDriver, address: &str, name: &str, room: &str) -> Vec<HubAction> {
    driver.process_event(HubEvent::RenameRequested(RenameRequest::new(address, name, room))).unwrap()
}

fn say(driver: &mut HubDriver, n: u64, text: &str) -> Vec<HubAction> {
    driver
        .process_event(HubEvent::MessageReceived {
            connection_id: id(n),
            payload: Payload::Text(text.to_string()),
        })
        .unwrap()
}

fn leave(driver: &mut HubDriver, n: u64) -> Vec<HubAction> {
    driver.process_event(HubEvent::Disconnected { connection_id: id(n) }).unwrap()
}

/// Messages delivered to connection `n`, in order.
fn inbox(actions: &[HubAction], n: u64) -> Vec<Outbound> {
    actions
        .iter()
        .filter_map(|action| match action {
            HubAction::Send { connection_id, message } if *connection_id == id(n) => {
                Some(message.clone())
            },
            _ => None,
        })
        .collect()
}

fn update(address: &str, name: &str, room: &str) -> Outbound {
    Outbound::NameUpdate(NameUpdate {
        address: IdentityKey::new(address),
        name: name.to_string(),
        room_hash: RoomToken::from(room),
    })
}

/// Two tabs on one machine, keyed per address so each tab is its own user.
#[test]
fn end_to_end_two_peers_in_public_room() {
    let mut driver = HubDriver::new(IdentityScheme::Address, DriverConfig::default());

    let actions = connect(&mut driver, 1, "/0:0:0:0:0:0:0:1:5001");
    assert_eq!(inbox(&actions, 1), vec![Outbound::YourAddress(AddressKey::from_remote("[::1]:5001"))]);

    let actions = rename(&mut driver, "localhost:5001", "Alice", "");
    assert_eq!(inbox(&actions, 1), vec![update("localhost:5001", "Alice", "")]);

    let actions = connect(&mut driver, 2, "[::1]:5002");
    assert_eq!(inbox(&actions, 2), vec![Outbound::YourAddress(AddressKey::from_remote("[::1]:5002"))]);
    assert!(inbox(&actions, 1).is_empty(), "presence is not announced on connect");

    let actions = rename(&mut driver, "localhost:5002", "Bob", "");
    assert_eq!(inbox(&actions, 1), vec![update("localhost:5002", "Bob", "")]);

    let to_bob = inbox(&actions, 2);
    assert_eq!(to_bob.len(), 2);
    assert!(to_bob.contains(&update("localhost:5002", "Bob", "")));
    assert!(to_bob.contains(&update("localhost:5001", "Alice", "")));

    let chat = r#"{"content":"hello","sender":"Alice"}"#;
    let actions = say(&mut driver, 1, chat);
    assert_eq!(inbox(&actions, 1), vec![Outbound::Relay(Payload::Text(chat.to_string()))]);
    assert_eq!(inbox(&actions, 2), vec![Outbound::Relay(Payload::Text(chat.to_string()))]);

    let actions = leave(&mut driver, 1);
    assert_eq!(inbox(&actions, 2), vec![Outbound::Closed(AddressKey::from_remote("[::1]:5001"))]);

    let err = driver
        .process_event(HubEvent::MessageReceived {
            connection_id: id(1),
            payload: Payload::Text("late".to_string()),
        })
        .unwrap_err();
    assert_eq!(err, HubError::UnknownConnection(id(1)));
}

/// With host-keyed identities two tabs on one machine are one user: the
/// second rename overwrites the first and the earlier tab is picked as the
/// joiner.
#[test]
fn same_host_tabs_share_one_identity() {
    let mut driver = HubDriver::new(IdentityScheme::Host, DriverConfig::default());

    connect(&mut driver, 1, "[::1]:5001");
    rename(&mut driver, "localhost", "Alice", "");
    connect(&mut driver, 2, "[::1]:5002");
    let actions = rename(&mut driver, "localhost", "Bob", "");

    assert_eq!(driver.presence().name_of(&IdentityKey::new("localhost")), Some("Bob"));
    assert_eq!(driver.presence().first_open_for(&IdentityKey::new("localhost")), Some(id(1)));

    // Both tabs hear the notice; tab 1 (the chosen joiner) also gets tab 2's
    // entry as roster, which now carries the shared name.
    assert_eq!(inbox(&actions, 2), vec![update("localhost", "Bob", "")]);
    assert_eq!(
        inbox(&actions, 1),
        vec![update("localhost", "Bob", ""), update("localhost", "Bob", "")]
    );
}

#[test]
fn rename_moves_identity_between_rooms() {
    let mut driver = HubDriver::new(IdentityScheme::Host, DriverConfig::default());

    connect(&mut driver, 1, "10.0.0.1:4000");
    connect(&mut driver, 2, "10.0.0.2:4000");
    rename(&mut driver, "10.0.0.1", "Al", "");
    rename(&mut driver, "10.0.0.2", "Bo", "");

    let actions = rename(&mut driver, "10.0.0.1", "Al", "secret");
    assert_eq!(inbox(&actions, 1), vec![update("10.0.0.1", "Al", "secret")]);
    assert!(inbox(&actions, 2).is_empty(), "old room is not told about the move");

    let actions = say(&mut driver, 2, "anyone?");
    assert!(inbox(&actions, 1).is_empty());
    assert_eq!(inbox(&actions, 2).len(), 1);
}

#[test]
fn rename_for_identity_without_connection_still_notifies_room() {
    let mut driver = HubDriver::new(IdentityScheme::Host, DriverConfig::default());

    connect(&mut driver, 1, "10.0.0.1:4000");
    rename(&mut driver, "10.0.0.1", "Al", "");

    let actions = rename(&mut driver, "10.9.9.9", "Ghost", "");

    assert_eq!(inbox(&actions, 1), vec![update("10.9.9.9", "Ghost", "")]);
}

#[test]
fn private_room_disconnect_is_not_heard_publicly() {
    let mut driver = HubDriver::new(IdentityScheme::Host, DriverConfig::default());

    connect(&mut driver, 1, "10.0.0.1:4000");
    connect(&mut driver, 2, "10.0.0.2:4000");
    connect(&mut driver, 3, "10.0.0.3:4000");
    rename(&mut driver, "10.0.0.1", "Al", "k");
    rename(&mut driver, "10.0.0.2", "Bo", "k");

    let actions = leave(&mut driver, 1);

    assert_eq!(inbox(&actions, 2), vec![Outbound::Closed(AddressKey::from_remote("10.0.0.1:4000"))]);
    assert!(inbox(&actions, 3).is_empty());
    assert!(driver.presence().name_of(&IdentityKey::new("10.0.0.1")).is_none());
}

#[test]
fn binary_payloads_are_relayed_verbatim() {
    let mut driver = HubDriver::new(IdentityScheme::Host, DriverConfig::default());

    connect(&mut driver, 1, "10.0.0.1:4000");
    connect(&mut driver, 2, "10.0.0.2:4000");

    let payload = Payload::Binary(bytes::Bytes::from_static(&[0, 159, 146, 150]));
    let actions = driver
        .process_event(HubEvent::MessageReceived { connection_id: id(1), payload: payload.clone() })
        .unwrap();

    assert_eq!(inbox(&actions, 2), vec![Outbound::Relay(payload)]);
}

//! In-memory calendar matching example.
//!
//! Runs both parties in one process and ferries the handshake messages by
//! hand, printing every step. No relay, no polling; this shows the raw
//! state machine.
//!
//! ```bash
//! cargo run --bin in_memory
//! ```

use calmatch_protocol::{CalendarEvent, Message, Role, Session, SessionId};

fn events(entries: &[(&str, &str, &str)]) -> Vec<CalendarEvent> {
    entries
        .iter()
        .map(|(uid, title, start)| CalendarEvent::new(*uid, *title, *start))
        .collect()
}

fn describe(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| m.body.kind())
        .collect::<Vec<_>>()
        .join(", ")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Calendar Matching (in-memory) ===\n");

    let alice_events = events(&[
        ("evt-standup", "Team standup", "2026-03-02T09:00:00Z"),
        ("evt-rustconf", "RustConf keynote", "2026-03-03T10:00:00Z"),
        ("evt-dentist", "Dentist", "2026-03-04T15:30:00Z"),
    ]);
    let bob_events = events(&[
        ("evt-rustconf", "RustConf keynote", "2026-03-03T10:00:00Z"),
        ("evt-gym", "Gym", "2026-03-03T18:00:00Z"),
        ("evt-standup", "Team standup", "2026-03-02T09:00:00Z"),
    ]);

    println!("Alice's calendar ({} events):", alice_events.len());
    for event in &alice_events {
        println!("  {} — {}", event.start, event.title);
    }
    println!("\nBob's calendar ({} events):", bob_events.len());
    for event in &bob_events {
        println!("  {} — {}", event.start, event.title);
    }

    // Alice creates the room, Bob joins it.
    let id = SessionId::from("DEMO42");
    let mut alice = Session::new(id.clone(), Role::Initiator, alice_events);
    let mut bob = Session::new(id, Role::Joiner, bob_events);

    println!("\n--- Handshake ---");
    alice.start();
    let mut to_alice = bob.start();
    println!("Bob -> relay: {}", describe(&to_alice));

    loop {
        let to_bob = alice.handle_batch(&to_alice)?;
        if !to_bob.is_empty() {
            println!("Alice -> relay: {}", describe(&to_bob));
        }
        to_alice = bob.handle_batch(&to_bob)?;
        if !to_alice.is_empty() {
            println!("Bob -> relay: {}", describe(&to_alice));
        }
        if to_bob.is_empty() && to_alice.is_empty() {
            break;
        }
    }

    println!("\n=== Results ===");
    println!("Alice sees {} shared events:", alice.matches().len());
    for event in alice.matches() {
        println!("  {} — {}", event.start, event.title);
    }
    println!("Bob sees {} shared events:", bob.matches().len());
    for event in bob.matches() {
        println!("  {} — {}", event.start, event.title);
    }

    // --- Encrypted notes about a shared event ---
    println!("\n--- Notes ---");
    let note = alice.compose_note("evt-rustconf", "Saving you a seat up front")?;
    bob.handle_batch(&[note])?;
    println!(
        "Bob decrypted Alice's note: {:?}",
        bob.notes()["evt-rustconf"]
    );

    let reply = bob.compose_note("evt-rustconf", "Bringing coffee for two")?;
    alice.handle_batch(&[reply])?;
    println!(
        "Alice decrypted Bob's note: {:?}",
        alice.notes()["evt-rustconf"]
    );

    println!("\n✓ Protocol completed!");
    Ok(())
}

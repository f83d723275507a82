//! Relay-polling calendar matching example.
//!
//! Runs both parties as independent polling drivers against an in-memory
//! relay, the way a real deployment polls the store-and-forward service.
//!
//! ```bash
//! RUST_LOG=info cargo run --bin relay_poll
//! ```

use calmatch_protocol::{
    CalendarEvent, InMemoryRelay, MessageTransport, Role, Session, SessionDriver, SessionState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn events(entries: &[(&str, &str, &str)]) -> Vec<CalendarEvent> {
    entries
        .iter()
        .map(|(uid, title, start)| CalendarEvent::new(*uid, *title, *start))
        .collect()
}

async fn wait_for_results(driver: &SessionDriver) {
    loop {
        if driver.session().lock().await.state() == SessionState::Results {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let relay: Arc<dyn MessageTransport> = Arc::new(InMemoryRelay::new());

    // Alice creates the room and shares the code out of band.
    let id = relay.create().await?;
    println!("Session code: {id}");

    let alice = Session::new(
        id.clone(),
        Role::Initiator,
        events(&[
            ("evt-standup", "Team standup", "2026-03-02T09:00:00Z"),
            ("evt-rustconf", "RustConf keynote", "2026-03-03T10:00:00Z"),
            ("evt-dentist", "Dentist", "2026-03-04T15:30:00Z"),
        ]),
    );
    let alice = SessionDriver::spawn(alice, Arc::clone(&relay), Duration::from_millis(200));

    // Bob joins with the shared code.
    relay.join(&id).await?;
    let bob = Session::new(
        id,
        Role::Joiner,
        events(&[
            ("evt-rustconf", "RustConf keynote", "2026-03-03T10:00:00Z"),
            ("evt-gym", "Gym", "2026-03-03T18:00:00Z"),
        ]),
    );
    let bob = SessionDriver::spawn(bob, Arc::clone(&relay), Duration::from_millis(200));

    wait_for_results(&alice).await;
    wait_for_results(&bob).await;

    for (name, driver) in [("Alice", &alice), ("Bob", &bob)] {
        let session = driver.session();
        let session = session.lock().await;
        println!("{name} sees {} shared event(s):", session.matches().len());
        for event in session.matches() {
            println!("  {} — {}", event.start, event.title);
        }
    }

    // A note about the shared event, carried over the same relay.
    alice.send_note("evt-rustconf", "Saving you a seat").await?;
    loop {
        if !bob.session().lock().await.notes().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    println!(
        "Bob decrypted: {:?}",
        bob.session().lock().await.notes()["evt-rustconf"]
    );

    alice.shutdown().await;
    bob.shutdown().await;
    println!("✓ Done");
    Ok(())
}

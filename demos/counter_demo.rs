//! Demonstrates the shared-counter flows end to end against a mock data API
//! with an in-memory session provider: cached reads, an increment, a refused
//! foreign delete, and an owned delete.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use tally_client::{
	auth::UserId,
	client::ClientFactory,
	config::Config,
	counter::{CounterEntry, CounterFlows, DeleteOutcome},
	session::{MemorySession, SessionProvider},
	view::CounterTable,
};

fn entry_json(id: &str, user: &str, added_at: &str) -> serde_json::Value {
	json!({ "id": id, "user_id": user, "added_at": added_at })
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/shared_counter");
			then.status(200)
				.header("content-type", "application/json")
				.header("Content-Range", "0-1/2")
				.json_body(json!([
					entry_json("entry-2", "someone-else", "2026-08-20T10:01:00Z"),
					entry_json("entry-1", "demo-user", "2026-08-20T10:00:00Z"),
				]));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/shared_counter");
			then.status(201)
				.header("content-type", "application/json")
				.json_body(json!([entry_json("entry-3", "demo-user", "2026-08-20T10:05:00Z")]));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(DELETE).path("/shared_counter").query_param("id", "eq.entry-1");
			then.status(204);
		})
		.await;

	let session = Arc::new(MemorySession::signed_in(UserId::new("demo-user")?, "demo-token"));
	let config = Config::from_base_url(&server.base_url())?;
	let flows = CounterFlows::new(session.clone(), ClientFactory::new(&config)?);
	let viewer = session.current_user();
	let snapshot = flows.snapshot().await?;

	println!("Requests go to {}.", config.data_api_url);
	println!("{}", CounterTable::new(&snapshot, viewer.as_ref()));

	let created = flows.increment().await?;

	println!("Incremented the counter with entry {}.", created.id);

	let foreign: CounterEntry = snapshot
		.entries
		.iter()
		.find(|entry| Some(&entry.user_id) != viewer.as_ref())
		.cloned()
		.expect("Demo dataset contains a foreign entry.");

	match flows.delete(&foreign).await? {
		DeleteOutcome::Refused { warning } => println!("Refused: {warning}"),
		DeleteOutcome::Deleted => println!("Unexpectedly deleted a foreign entry."),
	}

	let owned: CounterEntry = snapshot
		.entries
		.iter()
		.find(|entry| Some(&entry.user_id) == viewer.as_ref())
		.cloned()
		.expect("Demo dataset contains an owned entry.");

	match flows.delete(&owned).await? {
		DeleteOutcome::Deleted => println!("Deleted entry {}.", owned.id),
		DeleteOutcome::Refused { warning } => println!("Refused: {warning}"),
	}

	let after = flows.snapshot().await?;

	println!("{}", CounterTable::new(&after, viewer.as_ref()));

	Ok(())
}

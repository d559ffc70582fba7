//! PostgREST-style request builders over a single logical table resource.
//!
//! Shapes covered: ordered select with exact count, single-record insert, and
//! delete filtered by column equality. Every request carries the client's
//! bearer token in an `Authorization` header; no request is retried.

// crates.io
use reqwest::{RequestBuilder, Response, StatusCode, header};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	client::DataClient,
	error::{StoreError, TransportError},
};

/// Sort direction for ordered selects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
	/// Oldest value first.
	Ascending,
	/// Newest value first.
	Descending,
}
impl Order {
	const fn suffix(self) -> &'static str {
		match self {
			Order::Ascending => "asc",
			Order::Descending => "desc",
		}
	}
}

/// Page of rows plus the exact total row count when one was requested.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
	/// Deserialized rows in server order.
	pub rows: Vec<T>,
	/// Exact total reported via `Content-Range`, when requested.
	pub total: Option<u64>,
}

/// Entry point created by [`DataClient::table`].
#[derive(Debug)]
pub struct TableRequest {
	client: Arc<DataClient>,
	table: String,
}
impl TableRequest {
	pub(crate) fn new(client: Arc<DataClient>, table: String) -> Self {
		Self { client, table }
	}

	/// Starts an ordered select over the table.
	pub fn select(self) -> SelectBuilder {
		SelectBuilder {
			client: self.client,
			table: self.table,
			columns: "*".into(),
			order: None,
			count_exact: false,
		}
	}

	/// Starts an insert of one serializable record.
	///
	/// The record is wrapped in a one-element array on the wire; the server
	/// assigns primary key and timestamps.
	pub fn insert<T>(self, record: &T) -> Result<InsertBuilder>
	where
		T: Serialize,
	{
		let value = serde_json::to_value(record)
			.map_err(|e| StoreError::Serialization { message: e.to_string() })?;

		Ok(InsertBuilder {
			client: self.client,
			table: self.table,
			payload: serde_json::Value::Array(vec![value]),
		})
	}

	/// Starts a delete; add at least one filter before executing.
	pub fn delete(self) -> DeleteBuilder {
		DeleteBuilder { client: self.client, table: self.table, filters: Vec::new() }
	}
}

/// Ordered select with an optional exact count.
#[derive(Debug)]
pub struct SelectBuilder {
	client: Arc<DataClient>,
	table: String,
	columns: String,
	order: Option<(String, Order)>,
	count_exact: bool,
}
impl SelectBuilder {
	/// Restricts the selected columns (defaults to `*`).
	pub fn columns(mut self, columns: impl Into<String>) -> Self {
		self.columns = columns.into();

		self
	}

	/// Orders the result by the provided column.
	pub fn order(mut self, column: impl Into<String>, direction: Order) -> Self {
		self.order = Some((column.into(), direction));

		self
	}

	/// Requests an exact total row count alongside the page.
	pub fn count_exact(mut self) -> Self {
		self.count_exact = true;

		self
	}

	/// Executes the select and deserializes the row array.
	pub async fn fetch<T>(self) -> Result<Page<T>>
	where
		T: DeserializeOwned,
	{
		let mut url = self.client.endpoint(&self.table)?;

		{
			let mut pairs = url.query_pairs_mut();

			pairs.append_pair("select", &self.columns);

			if let Some((column, direction)) = &self.order {
				pairs.append_pair("order", &format!("{column}.{}", direction.suffix()));
			}
		}

		let mut request = self.client.http().get(url).bearer_auth(self.client.token().expose());

		if self.count_exact {
			request = request.header("Prefer", "count=exact");
		}

		let response = send(request).await?;
		let total = if self.count_exact { Some(exact_count(&response)?) } else { None };
		let rows = parse_body(response).await?;

		Ok(Page { rows, total })
	}
}

/// Insert of one record.
#[derive(Debug)]
pub struct InsertBuilder {
	client: Arc<DataClient>,
	table: String,
	payload: serde_json::Value,
}
impl InsertBuilder {
	/// Executes the insert and returns the created rows.
	pub async fn returning<T>(self) -> Result<Vec<T>>
	where
		T: DeserializeOwned,
	{
		let url = self.client.endpoint(&self.table)?;
		let request = self
			.client
			.http()
			.post(url)
			.bearer_auth(self.client.token().expose())
			.header("Prefer", "return=representation")
			.json(&self.payload);
		let response = send(request).await?;

		parse_body(response).await
	}

	/// Executes the insert and discards the response body.
	pub async fn execute(self) -> Result<()> {
		let url = self.client.endpoint(&self.table)?;
		let request = self
			.client
			.http()
			.post(url)
			.bearer_auth(self.client.token().expose())
			.header("Prefer", "return=minimal")
			.json(&self.payload);

		send(request).await?;

		Ok(())
	}
}

/// Delete filtered by column equality.
#[derive(Debug)]
pub struct DeleteBuilder {
	client: Arc<DataClient>,
	table: String,
	filters: Vec<(String, String)>,
}
impl DeleteBuilder {
	/// Restricts the delete to rows whose column equals the value.
	pub fn eq(mut self, column: impl Into<String>, value: impl Display) -> Self {
		self.filters.push((column.into(), format!("eq.{value}")));

		self
	}

	/// Executes the delete.
	///
	/// An unfiltered delete is refused locally; a missing filter here would
	/// otherwise clear the whole table.
	pub async fn execute(self) -> Result<()> {
		if self.filters.is_empty() {
			return Err(StoreError::UnfilteredDelete.into());
		}

		let mut url = self.client.endpoint(&self.table)?;

		{
			let mut pairs = url.query_pairs_mut();

			for (column, filter) in &self.filters {
				pairs.append_pair(column, filter);
			}
		}

		let request = self
			.client
			.http()
			.delete(url)
			.bearer_auth(self.client.token().expose())
			.header("Prefer", "return=minimal");

		send(request).await?;

		Ok(())
	}
}

async fn send(request: RequestBuilder) -> Result<Response> {
	let response = request.send().await.map_err(TransportError::from)?;
	let status = response.status();

	if status.is_success() {
		return Ok(response);
	}

	let body = response.text().await.unwrap_or_default();

	Err(api_error(status, &body).into())
}

fn api_error(status: StatusCode, body: &str) -> StoreError {
	#[derive(Deserialize)]
	struct ApiErrorBody {
		message: Option<String>,
		code: Option<String>,
	}

	let parsed = serde_json::from_str::<ApiErrorBody>(body).ok();
	let (message, code) = match parsed {
		Some(body) => (body.message, body.code),
		None => (None, None),
	};
	let message = message.unwrap_or_else(|| {
		status.canonical_reason().unwrap_or("unrecognized data API failure").to_owned()
	});

	StoreError::Api { status: status.as_u16(), message, code }
}

fn exact_count(response: &Response) -> Result<u64, StoreError> {
	response
		.headers()
		.get(header::CONTENT_RANGE)
		.and_then(|value| value.to_str().ok())
		.and_then(parse_exact_count)
		.ok_or(StoreError::MissingExactCount)
}

/// Parses the `/total` suffix of a `Content-Range` value (`0-24/25` or `*/0`).
fn parse_exact_count(raw: &str) -> Option<u64> {
	raw.rsplit('/').next()?.trim().parse().ok()
}

async fn parse_body<T>(response: Response) -> Result<Vec<T>>
where
	T: DeserializeOwned,
{
	let status = response.status();
	let body = response.bytes().await.map_err(TransportError::from)?;
	let mut deserializer = serde_json::Deserializer::from_slice(&body);

	serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
		StoreError::ResponseParse { source, status: Some(status.as_u16()) }.into()
	})
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn content_range_totals_parse() {
		assert_eq!(parse_exact_count("0-24/25"), Some(25));
		assert_eq!(parse_exact_count("*/0"), Some(0));
		assert_eq!(parse_exact_count("*/*"), None);
		assert_eq!(parse_exact_count("garbage"), None);
	}

	#[test]
	fn api_error_prefers_the_body_message() {
		let err = api_error(
			StatusCode::UNAUTHORIZED,
			"{\"message\":\"JWT expired\",\"code\":\"PGRST301\"}",
		);

		assert!(matches!(
			err,
			StoreError::Api { status: 401, ref message, ref code }
				if message == "JWT expired" && code.as_deref() == Some("PGRST301")
		));
	}

	#[test]
	fn api_error_falls_back_to_the_status_reason() {
		let err = api_error(StatusCode::BAD_GATEWAY, "<html>oops</html>");

		assert!(matches!(
			err,
			StoreError::Api { status: 502, ref message, code: None } if message == "Bad Gateway"
		));
	}

	#[test]
	fn order_suffixes_match_the_wire_format() {
		assert_eq!(Order::Ascending.suffix(), "asc");
		assert_eq!(Order::Descending.suffix(), "desc");
	}
}

//! Text view-model for the counter table.
//!
//! Rows are presented newest-first with an ownership marker for the viewing
//! user; an empty dataset renders a single placeholder row.

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	auth::{EntryId, UserId},
	counter::CounterSnapshot,
};

/// Column headers of the rendered counter table.
pub const COLUMNS: [&str; 3] = ["User ID", "Added At", ""];
/// Placeholder text shown when the dataset is empty.
pub const EMPTY_PLACEHOLDER: &str = "No entries yet";
/// Suffix appended to rows owned by the viewing user.
pub const VIEWER_SUFFIX: &str = " (you)";

/// One rendered row of the counter table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableRow {
	/// Placeholder spanning all columns; rendered only for an empty dataset.
	Placeholder,
	/// Row backed by a counter entry.
	Entry {
		/// Entry id, driving the per-row delete action.
		id: EntryId,
		/// User that added the entry.
		user: UserId,
		/// Insertion instant.
		added_at: OffsetDateTime,
		/// Whether the viewing user owns the row.
		owned: bool,
	},
}

/// View-model for the counter table: newest-first rows plus the exact total.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CounterTable {
	total: u64,
	rows: Vec<TableRow>,
}
impl CounterTable {
	/// Builds the view-model for a snapshot as seen by `viewer`.
	pub fn new(snapshot: &CounterSnapshot, viewer: Option<&UserId>) -> Self {
		let rows = if snapshot.entries.is_empty() {
			vec![TableRow::Placeholder]
		} else {
			snapshot
				.entries
				.iter()
				.map(|entry| TableRow::Entry {
					id: entry.id.clone(),
					user: entry.user_id.clone(),
					added_at: entry.added_at,
					owned: viewer.is_some_and(|viewer| *viewer == entry.user_id),
				})
				.collect()
		};

		Self { total: snapshot.total, rows }
	}

	/// Exact total shown in the heading.
	pub fn total(&self) -> u64 {
		self.total
	}

	/// Rendered rows, newest-first.
	pub fn rows(&self) -> &[TableRow] {
		&self.rows
	}

	/// `true` when the placeholder row is shown.
	pub fn is_placeholder(&self) -> bool {
		matches!(self.rows.as_slice(), [TableRow::Placeholder])
	}
}
impl Display for CounterTable {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		writeln!(f, "The shared counter is {}.", self.total)?;
		writeln!(f, "{} | {}", COLUMNS[0], COLUMNS[1])?;

		for row in &self.rows {
			match row {
				TableRow::Placeholder => writeln!(f, "{EMPTY_PLACEHOLDER}")?,
				TableRow::Entry { user, added_at, owned, .. } => {
					let stamp = added_at.format(&Rfc3339).map_err(|_| std::fmt::Error)?;
					let suffix = if *owned { VIEWER_SUFFIX } else { "" };

					writeln!(f, "{user}{suffix} | {stamp}")?;
				},
			}
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::counter::CounterEntry;

	fn entry(id: &str, user: &str, minute: u8) -> CounterEntry {
		CounterEntry {
			id: EntryId::new(id).expect("Entry fixture should be valid."),
			user_id: UserId::new(user).expect("User fixture should be valid."),
			added_at: macros::datetime!(2026-08-20 10:00 UTC) + Duration::minutes(minute.into()),
		}
	}

	#[test]
	fn empty_dataset_renders_exactly_one_placeholder_row() {
		let snapshot = CounterSnapshot { entries: vec![], total: 0 };
		let table = CounterTable::new(&snapshot, None);

		assert_eq!(table.rows(), [TableRow::Placeholder]);
		assert!(table.is_placeholder());
		assert!(table.to_string().contains(EMPTY_PLACEHOLDER));
	}

	#[test]
	fn non_empty_dataset_never_renders_the_placeholder() {
		let viewer = UserId::new("user-1").expect("Viewer fixture should be valid.");
		let snapshot = CounterSnapshot {
			entries: vec![entry("e2", "user-2", 1), entry("e1", "user-1", 0)],
			total: 2,
		};
		let table = CounterTable::new(&snapshot, Some(&viewer));

		assert!(!table.is_placeholder());
		assert!(table.rows().iter().all(|row| *row != TableRow::Placeholder));
		assert_eq!(table.rows().len(), 2);
	}

	#[test]
	fn viewer_rows_are_marked_as_owned() {
		let viewer = UserId::new("user-1").expect("Viewer fixture should be valid.");
		let snapshot = CounterSnapshot {
			entries: vec![entry("e2", "user-2", 1), entry("e1", "user-1", 0)],
			total: 2,
		};
		let table = CounterTable::new(&snapshot, Some(&viewer));
		let owned: Vec<bool> = table
			.rows()
			.iter()
			.map(|row| matches!(row, TableRow::Entry { owned: true, .. }))
			.collect();

		assert_eq!(owned, [false, true]);

		let rendered = table.to_string();

		assert!(rendered.contains("The shared counter is 2."));
		assert!(rendered.contains(&format!("user-1{VIEWER_SUFFIX}")));
		assert!(!rendered.contains(&format!("user-2{VIEWER_SUFFIX}")));
	}
}

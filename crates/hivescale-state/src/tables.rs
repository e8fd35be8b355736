//! redb table definitions.

use redb::TableDefinition;

/// Coordination records keyed by `{namespace}/{kind}-{id}`, JSON values.
pub const COORDINATION: TableDefinition<&str, &[u8]> = TableDefinition::new("coordination");

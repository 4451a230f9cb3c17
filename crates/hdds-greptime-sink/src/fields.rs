// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON encoding of a record's structured fields.

use crate::record::Fields;

/// Encode fields as compact JSON for the `fields` column.
///
/// Empty maps (and maps that fail to serialize) become `"{}"`.
pub fn encode_fields(fields: &Fields) -> String {
    if fields.is_empty() {
        return "{}".to_string();
    }
    serde_json::to_string(fields).unwrap_or_else(|e| {
        tracing::warn!("Failed to encode log fields: {}", e);
        "{}".to_string()
    })
}

//! Fixed vocabulary shared by the scanner, the validator, and the executor.

/// Reserved words, matched case-insensitively by the scanner.
pub const KEYWORDS: &[&str] = &[
    "MATCH", "WHERE", "RETURN", "AND", "OR", "NOT", "AS", "DISTINCT", "CONTAINS", "STARTS",
    "WITH", "ENDS", "IS", "NULL", "TRUE", "FALSE", "COUNT", "COLLECT",
];

/// Node labels a pattern may filter on. Compared case-sensitively.
pub const VALID_LABELS: &[&str] = &[
    "Node",
    "Index",
    "Skill",
    "Entrypoint",
    "Reference",
    "Asset",
    "Document",
];

/// Relationship types a pattern may filter on. Compared case-sensitively.
pub const VALID_REL_TYPES: &[&str] = &[
    "LINKS_TO",
    "CONTAINS",
    "REFERENCES",
    "HAS_ENTRYPOINT",
    "HAS_INDEX",
    "DEPENDS_ON",
];

/// Hop limit applied to variable-length relationships without an upper bound.
pub const MAX_TRAVERSAL_DEPTH: u32 = 10;

pub fn is_valid_label(label: &str) -> bool {
    VALID_LABELS.contains(&label)
}

pub fn is_valid_rel_type(rel_type: &str) -> bool {
    VALID_REL_TYPES.contains(&rel_type)
}

//! SQL fragments for version-gated upserts.
//!
//! The conflict rule is the same for every mirrored entity but its column
//! list is not, so each repository spells its columns out and these macros
//! supply the per-column `CASE` expression. Two gates exist: by upstream
//! mutation timestamp (most entities) and by version counter (entities the
//! provider exposes no timestamp for).

/// Assign `EXCLUDED.<col>` only when the incoming row is newer by
/// `updated_at_upstream` (or nothing is stored yet).
macro_rules! ts_gated {
    ($table:literal, $col:ident) => {
        $col.eq(diesel::dsl::sql(concat!(
            "CASE WHEN EXCLUDED.updated_at_upstream > ",
            $table,
            ".updated_at_upstream OR ",
            $table,
            ".updated_at_upstream IS NULL THEN EXCLUDED.",
            stringify!($col),
            " ELSE ",
            $table,
            ".",
            stringify!($col),
            " END"
        )))
    };
}

/// Assign `EXCLUDED.<col>` only when the incoming version is not older.
macro_rules! version_gated {
    ($table:literal, $col:ident) => {
        $col.eq(diesel::dsl::sql(concat!(
            "CASE WHEN EXCLUDED.version >= ",
            $table,
            ".version THEN EXCLUDED.",
            stringify!($col),
            " ELSE ",
            $table,
            ".",
            stringify!($col),
            " END"
        )))
    };
}

/// Write `<col>` only when it is still NULL (first observation wins).
macro_rules! keep_first {
    ($table:literal, $col:ident) => {
        $col.eq(diesel::dsl::sql(concat!(
            "CASE WHEN ",
            $table,
            ".",
            stringify!($col),
            " IS NULL THEN EXCLUDED.",
            stringify!($col),
            " ELSE ",
            $table,
            ".",
            stringify!($col),
            " END"
        )))
    };
}

/// Touch the local `updated_at` housekeeping column only when the gate
/// accepted the incoming row; a rejected stale row must leave the stored
/// row byte-identical.
macro_rules! ts_touch {
    ($table:literal, $col:ident) => {
        $col.eq(diesel::dsl::sql(concat!(
            "CASE WHEN EXCLUDED.updated_at_upstream > ",
            $table,
            ".updated_at_upstream OR ",
            $table,
            ".updated_at_upstream IS NULL THEN now() ELSE ",
            $table,
            ".",
            stringify!($col),
            " END"
        )))
    };
}

/// Version-gated variant of [`ts_touch!`].
macro_rules! version_touch {
    ($table:literal, $col:ident) => {
        $col.eq(diesel::dsl::sql(concat!(
            "CASE WHEN EXCLUDED.version >= ",
            $table,
            ".version THEN now() ELSE ",
            $table,
            ".",
            stringify!($col),
            " END"
        )))
    };
}

/// The stored upstream timestamp only ever moves forward.
macro_rules! newest_ts {
    ($table:literal, $col:ident) => {
        $col.eq(diesel::dsl::sql(concat!(
            "GREATEST(",
            $table,
            ".",
            stringify!($col),
            ", EXCLUDED.",
            stringify!($col),
            ")"
        )))
    };
}

#![forbid(unsafe_code)]

/// `embed_migrations!` is not re-run when only migration files change,
/// so the crate is rebuilt whenever the migration directory changes.
fn main() {
    println!("cargo:rerun-if-changed=./migrations");
}

use super::print_json;
use miette::Result;
use regcache_core::manifest::next_revision;
use serde::Serialize;

#[derive(Serialize)]
struct RevisionResult<'a> {
    previous: &'a str,
    next: String,
}

pub fn run(rev: &str, json: bool) -> Result<()> {
    let next = next_revision(rev);
    if json {
        print_json(&RevisionResult {
            previous: rev,
            next,
        })
    } else {
        println!("{next}");
        Ok(())
    }
}

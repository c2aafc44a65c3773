//! Integration tests driving the release-train binary

mod helpers;
mod test_plan;
mod test_run;

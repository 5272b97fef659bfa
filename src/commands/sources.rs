use std::path::Path;

use crate::error::Result;
use crate::model::Tracking;
use crate::output::{self, Format};

pub fn run(sources: Option<&Path>, format: Format) -> Result<()> {
    let tracking = Tracking::load(sources)?;
    output::print_tracking(&tracking, format)
}

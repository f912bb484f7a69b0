mod application;
mod presentation;

use unccp_core::error::Result;

fn main() -> Result<()> {
    application::run()
}

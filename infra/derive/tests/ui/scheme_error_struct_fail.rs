use schemefs_derive::scheme_error;

#[scheme_error]
pub struct DemoError {
    message: String,
}

fn main() {}

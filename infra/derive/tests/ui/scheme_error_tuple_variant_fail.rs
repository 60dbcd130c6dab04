use schemefs_derive::scheme_error;

#[scheme_error]
pub enum DemoError {
    Io(std::io::Error),
}

fn main() {}

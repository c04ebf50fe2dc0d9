use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    rowbind_build::build!("rowbind.toml");

    Ok(())
}

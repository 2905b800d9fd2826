use anyhow::Context;

fn main() -> anyhow::Result<()> {
    let lines = xwire::run(&xwire_demo::render()).context("render failed")?;
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

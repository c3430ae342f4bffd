//! vkrun CLI — drive a Vibe Kanban board from a declarative task manifest.

use clap::Parser;

fn main() {
    // Argument errors exit 1 like every other failure, not clap's default 2
    let args = match vkrun::cli::Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };
    if let Err(e) = vkrun::cli::run(&args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

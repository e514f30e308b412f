use clap::Parser;
use kct::cli::{Cli, Commands};
use miette::Result;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    // This is standard practice for CLI tools that output to stdout.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    match cli.command {
        Commands::Init(args) => kct::cli::commands::init::run(args),
        Commands::Exp(cmd) => kct::cli::commands::exp::run(cmd, &global),
        Commands::Ms(cmd) => kct::cli::commands::ms::run(cmd, &global),
        Commands::Scope(cmd) => kct::cli::commands::scope::run(cmd, &global),
        Commands::Doc(cmd) => kct::cli::commands::doc::run(cmd, &global),
        Commands::Config(cmd) => kct::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => kct::cli::commands::completions::run(args),
    }
}

use std::{env, fs, path::PathBuf};

fn http_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("30"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests"))
        .arg(clap::arg!(--retries <NUM> "Extra attempts per page after the first one fails").default_value("2"))
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let harvest = clap::Command::new("harvest")
        .about("Collect the index and fill missing article bodies")
        .arg(
            clap::arg!(--csv <FILE> "CSV file to read and update")
                .default_value("articles.csv")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--"no-index" "Skip index collection and only use rows already in the CSV"))
        .arg(clap::arg!(--"only-index" "Only collect the index; do not fill bodies"))
        .arg(
            clap::arg!(--pages <NUM> "Number of listing pages to scan")
                .default_value("117")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(clap::arg!(--limit <NUM> "Fill at most this many empty-body rows"))
        .arg(clap::arg!(--"checkpoint-every" <NUM> "Save the CSV after every N processed rows"))
        .arg(clap::arg!(--"base-url" <URL> "Listing root URL").default_value("https://aps-repo.bvs.br/aps"))
        .arg(clap::arg!(--"delay-ms" <MS> "Pause after each fetched page, in milliseconds").default_value("200"));

    let extract = clap::Command::new("extract")
        .about("Extract the body of a single article page")
        .arg(clap::arg!(<INPUT> "URL to fetch, local HTML file, or '-' for stdin"))
        .arg(clap::arg!(--url <URL> "URL the page came from (used when the page has no canonical link)"))
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (text, json)")
                .default_value("text")
                .value_parser(["text", "json"]),
        )
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        );

    let mut cmd = clap::Command::new("gleaner")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Harvest article listings and bodies into a CSV table")
        .arg(clap::arg!(-v --verbose "Enable debug logging").global(true))
        .arg(clap::arg!(-q --quiet "Hide progress bars and status messages").global(true))
        .subcommand(http_args(harvest))
        .subcommand(http_args(extract));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "gleaner", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "gleaner", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "gleaner", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "gleaner", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}

fn main() -> anyhow::Result<()> {
    pigweb::cli::run_cli()
}

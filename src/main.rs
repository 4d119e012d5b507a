fn main() -> anyhow::Result<()> {
    parnik::cli::run()
}

fn main() -> anyhow::Result<()> {
    quicknote::cli::run()
}

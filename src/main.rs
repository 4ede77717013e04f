fn main() -> anyhow::Result<()> {
    repcount_lib::run()
}

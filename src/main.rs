fn main() -> anyhow::Result<()>
{
        stride::run()
}

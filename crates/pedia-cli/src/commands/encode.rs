use super::QueryArgs;

pub fn encode(query: &QueryArgs) -> anyhow::Result<()> {
    let options = query.builder()?.options();
    println!("{}", serde_json::to_string_pretty(&options)?);
    Ok(())
}

/// Build the search instruction for a playground at `address`.
///
/// A blank `name` is treated the same as no name.
pub fn build_prompt(address: &str, name: Option<&str>) -> String {
    let name = name.map(str::trim).filter(|n| !n.is_empty());

    let target = match name {
        Some(name) => format!("the playground \"{}\" located at {}", name, address),
        None => format!("the playground located at {}", address),
    };

    format!(
        r#"Find information about {target}.

Location rules:
- Only use results for the exact address above, or for a place within roughly 200 meters of it when that place is clearly associated with a named park, school or facility at this address.
- Ignore playgrounds, parks or businesses in other neighborhoods or cities, even if they share a similar name.
- If you cannot confirm the playground with confidence, do not guess.

Image rules:
- Only return images that show this specific playground or its equipment.
- Do not return maps, logos, stock photos or images of other locations.

Respond with a single JSON object and nothing else, using exactly this shape:
```json
{{
  "name": "name of the playground or the park/facility that contains it",
  "description": "a short summary (2-3 sentences) for parents",
  "features": ["short feature labels such as slide, swing, climbing wall, sandbox, splash pad"],
  "parking": "nearby parking options"
}}
```

If the playground cannot be found with confidence, respond with all four fields set to null:
```json
{{"name": null, "description": null, "features": null, "parking": null}}
```"#
    )
}

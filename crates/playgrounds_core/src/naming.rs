/// Convert a display name into a lowerCamelCase collection name.
///
/// Runs of anything other than letters and digits separate words. The whole first
/// word is lowercased, every later word gets an uppercase first character with the
/// rest left as is. Input without any letters or digits yields an empty string.
pub fn to_camel_case(value: &str) -> String {
    let words = split_words(value);
    let mut output = String::with_capacity(value.len());
    for (index, word) in words.iter().enumerate() {
        if index == 0 {
            output.push_str(&word.to_lowercase());
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            output.extend(first.to_uppercase());
            output.push_str(chars.as_str());
        }
    }
    output
}

fn split_words(value: &str) -> Vec<&str> {
    value
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect()
}

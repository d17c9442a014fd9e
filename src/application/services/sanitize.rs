/// Longest run of plain spaces the provider accepts inside a template parameter.
const MAX_SPACE_RUN: usize = 3;

/// Normalizes user text for template parameters. The provider rejects
/// parameters with new-line or tab characters or four or more spaces in a row.
///
/// A whitespace run containing anything other than plain spaces becomes a
/// single space, a run of plain spaces is capped at three, and the result is
/// trimmed. Applying it twice yields the same string.
pub fn sanitize_parameter(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if !ch.is_whitespace() {
            output.push(ch);
            continue;
        }

        let mut run_len = 1;
        let mut only_spaces = ch == ' ';
        while let Some(&next) = chars.peek() {
            if !next.is_whitespace() {
                break;
            }
            only_spaces &= next == ' ';
            run_len += 1;
            chars.next();
        }

        let width = if only_spaces {
            run_len.min(MAX_SPACE_RUN)
        } else {
            1
        };
        output.extend(std::iter::repeat_n(' ', width));
    }

    output.trim().to_string()
}

/// Reduces a phone number to the digits the provider expects in `to`.
pub fn format_phone_number(phone: &str) -> String {
    phone.chars().filter(|ch| ch.is_ascii_digit()).collect()
}

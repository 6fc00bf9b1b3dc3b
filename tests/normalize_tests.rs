use convoscope::normalize::normalize;

#[test]
fn lowercases_and_strips_punctuation() {
    assert_eq!(normalize("Hello, World!!!"), "hello world");
    assert_eq!(normalize("Can't charge?? (again)"), "cant charge again");
}

#[test]
fn preserves_hangul() {
    assert_eq!(normalize("충전이 안돼요!!"), "충전이 안돼요");
    assert_eq!(normalize("배터리... 10% 남았어요"), "배터리 10 남았어요");
}

#[test]
fn collapses_whitespace_and_trims() {
    assert_eq!(normalize("  too   many\t\tspaces \n here  "), "too many spaces here");
}

#[test]
fn degenerate_inputs_yield_empty() {
    assert_eq!(normalize(""), "");
    assert_eq!(normalize("?!... ---"), "");
    assert_eq!(normalize("   "), "");
}

#[test]
fn deterministic() {
    let text = "Mixed 한글 and English: 충전기 ERROR #42!";
    assert_eq!(normalize(text), normalize(text));
}

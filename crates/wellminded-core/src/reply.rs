/// Strip simple markdown decoration from a reply before it enters the
/// transcript.
///
/// The substitutions run in a fixed order and each one sees the output of
/// the previous one:
///
/// 1. remove every `#`
/// 2. remove every `*`
/// 3. replace `###` with a blank line
/// 4. replace every `-` with a line-initial bullet (`\n- `)
///
/// Step 1 already removed all `#`, so step 3 never matches. The order is
/// kept anyway; see DESIGN.md.
pub fn format_reply(reply: &str) -> String {
    reply
        .replace('#', "")
        .replace('*', "")
        .replace("###", "\n\n")
        .replace('-', "\n- ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashes_removed_before_section_break() {
        assert_eq!(format_reply("#Hi# ###-ok"), "Hi \n- ok");
    }

    #[test]
    fn test_title_and_item() {
        assert_eq!(format_reply("# Title ### - item"), " Title  \n-  item");
    }

    #[test]
    fn test_triple_hash_alone_disappears() {
        assert_eq!(format_reply("###"), "");
        assert_eq!(format_reply("a###b"), "ab");
    }

    #[test]
    fn test_bold_markers_removed() {
        assert_eq!(format_reply("**Breathe** slowly"), "Breathe slowly");
    }

    #[test]
    fn test_every_hyphen_becomes_bullet() {
        assert_eq!(format_reply("self-care"), "self\n- care");
        assert_eq!(format_reply("-a -b"), "\n- a \n- b");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(format_reply("You look calm today."), "You look calm today.");
    }
}

#![no_main]

use id3core::id3v2::Tag;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Any result is fine, the parser just must not panic or hang.
    if let Ok(mut tag) = Tag::parse(data) {
        let _ = tag.render();
    }
});

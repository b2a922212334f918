/// Generates a `repr(u8)` enum from `Variant = byte` pairs, along with a `parse` function
/// mapping a raw byte back to its variant. Bytes with no variant become `$fallback`.
macro_rules! byte_enum {(
    $(#[$meta:meta])*
    $vis:vis enum $name:ident {
        $($(#[$vmeta:meta])* $variant:ident = $val:literal,)*
    };
    $fallback:expr
) => {
        $(#[$meta])*
        #[repr(u8)]
        #[derive(Clone, Copy, Debug, Eq, PartialEq)]
        $vis enum $name {
            $($(#[$vmeta])*
            $variant = $val,)*
        }

        impl $name {
            pub(crate) fn parse(byte: u8) -> Self {
                match byte {
                    $($val => Self::$variant,)*
                    _ => $fallback
                }
            }
        }
    }
}

/// Matches a four-byte identifier against a list of byte-string literals.
macro_rules! is_id {
    ($id:expr, $($lit:literal),+ $(,)?) => {
        matches!($id.inner(), $($lit)|+)
    };
}

#[cfg(test)]
macro_rules! make_frame {
    ($dty:ty, $data:expr, $dest:ident) => {
        make_frame!($dty, $data, crate::id3v2::tag::Version::V24, $dest)
    };

    ($dty:ty, $data:expr, $ver:expr, $dest:ident) => {
        let parsed = crate::id3v2::frames::parse(
            &crate::id3v2::tag::TagHeader::with_version($ver),
            &mut crate::core::io::BufStream::new($data),
        )
        .unwrap();

        let frame = if let crate::id3v2::frames::FrameResult::Frame(frame) = parsed {
            frame
        } else {
            panic!("frame was dropped")
        };

        let $dest = frame.downcast::<$dty>().unwrap();
    };
}

#[cfg(test)]
macro_rules! assert_render {
    ($frame:expr, $data:expr) => {
        assert_render!($frame, $data, crate::id3v2::tag::Version::V24)
    };

    ($frame:expr, $data:expr, $ver:expr) => {
        assert!(!$frame.is_empty());
        assert_eq!(
            crate::id3v2::frames::render(
                &crate::id3v2::tag::TagHeader::with_version($ver),
                &crate::id3v2::frames::Frame::from($frame.clone())
            )
            .unwrap(),
            $data
        )
    };
}

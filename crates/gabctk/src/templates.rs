//! Static documents the rendered music is dropped into.

use gabc::{Abc, LilyPond};

const LILYPOND: &str = r#"\version "2.18"

\header {
  title = "@TITLE@"
  tagline = ""
  composer = ""
}

\paper {
 #(include-special-characters)
}

MusiqueTheme = {
 \key @KEY@ \major
@MUSIC@}

Paroles = \lyricmode {
 @LYRICS@
}

\score{
  <<
    \new Staff <<
      \set Staff.midiInstrument = "flute"
      \set Staff.autoBeaming = ##f
      \new Voice = "theme" {
        \override Score.Slur #'stencil = ##f
        \cadenzaOn \MusiqueTheme
        \revert Score.Slur #'stencil
      }
    >>
    \new Lyrics \lyricsto theme {
      \Paroles
    }
  >>
  \layout{}
  \midi{}
}
"#;

pub fn lilypond(title: &str, lily: &LilyPond) -> String {
    LILYPOND
        .replace("@TITLE@", &title.replace('"', "\\\""))
        .replace("@KEY@", &lily.key)
        .replace("@MUSIC@", &lily.music)
        .replace("@LYRICS@", &lily.lyrics)
}

pub fn abc(title: &str, tempo: u16, abc: &Abc) -> String {
    format!(
        "X:1\nT:{}\nM:none\nL:1/8\nQ:1/8={}\nK:{}\n{}",
        title,
        tempo,
        abc.key,
        abc.body()
    )
}

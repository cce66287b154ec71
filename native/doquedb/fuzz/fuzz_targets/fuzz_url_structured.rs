#![no_main]
//! Structured connection-string fuzzing
//!
//! Builds inputs that mostly look like DoqueDB targets, with each token
//! possibly mangled, to reach the port and database branches of the parser.

use arbitrary::Arbitrary;
use doquedb::url::parse;
use libfuzzer_sys::fuzz_target;

/// Connection-string-like input for fuzzing
#[derive(Debug, Arbitrary)]
struct UrlInput<'a> {
    scheme: Token<'a>,
    vendor: Token<'a>,
    dialect: Token<'a>,
    slashes: bool,
    host: &'a str,
    port: Port<'a>,
    database: Option<&'a str>,
}

#[derive(Debug, Arbitrary)]
enum Token<'a> {
    Expected,
    Random(&'a str),
}

#[derive(Debug, Arbitrary)]
enum Port<'a> {
    Number(u32),
    Raw(&'a str),
}

impl UrlInput<'_> {
    fn render(&self) -> String {
        let token = |t: &Token, expected: &str| match t {
            Token::Expected => expected.to_string(),
            Token::Random(s) => s.to_string(),
        };
        let port = match &self.port {
            Port::Number(n) => n.to_string(),
            Port::Raw(s) => s.to_string(),
        };
        let mut url = format!(
            "{}:{}:{}:{}{}:{}",
            token(&self.scheme, "jdbc"),
            token(&self.vendor, "ricoh"),
            token(&self.dialect, "doquedb"),
            if self.slashes { "//" } else { "" },
            self.host,
            port
        );
        if let Some(db) = self.database {
            url.push('/');
            url.push_str(db);
        }
        url
    }
}

fuzz_target!(|input: UrlInput| {
    let url = input.render();
    if let Some(target) = parse(&url) {
        // Whatever is accepted must render back to something accepted
        assert_eq!(parse(&target.url()).as_ref(), Some(&target));
    }
});

//! Remote host extraction from ssh/mosh command lines.
//!
//! # Responsibilities
//! - Recognize ssh-like programs by basename
//! - Skip options (and the values of options that take one)
//! - Normalize the first positional argument to a bare lowercase host
//!
//! # Design Decisions
//! - Pure functions over strings; no I/O
//! - Unknown flags are assumed to take no value
//! - IPv6 literals are only recognized in brackets

/// Programs whose first positional argument is a host.
const SSH_COMMANDS: &[&str] = &["ssh", "slogin", "mosh", "mosh-client"];

/// ssh options that take a value.
const OPTIONS_WITH_ARG: &[&str] = &[
    "-b", // bind address
    "-B", // bind interface
    "-c", // cipher spec
    "-D", // dynamic forward
    "-E", // log file
    "-F", // config file
    "-I", // PKCS#11 library
    "-i", // identity file
    "-J", // jump host
    "-L", // local forward
    "-l", // login name
    "-m", // MAC spec
    "-O", // control command
    "-o", // option
    "-p", // port
    "-Q", // query
    "-R", // remote forward
    "-S", // control socket
    "-W", // stdio forward
    "-w", // tunnel device
];

/// Parse a whitespace-separated command line.
///
/// ```
/// use nerd_icons::host::parse_host;
///
/// assert_eq!(parse_host("ssh -p 2222 deploy@Web1.Example.com").as_deref(), Some("web1.example.com"));
/// assert_eq!(parse_host("vim notes.txt"), None);
/// ```
pub fn parse_host(cmdline: &str) -> Option<String> {
    let argv: Vec<&str> = cmdline.split_whitespace().collect();
    parse_host_args(&argv)
}

/// Parse an argument vector, e.g. from `/proc/<pid>/cmdline`.
pub fn parse_host_args<S: AsRef<str>>(argv: &[S]) -> Option<String> {
    let (program, args) = argv.split_first()?;
    if !is_ssh_command(program.as_ref()) {
        return None;
    }

    let target = first_positional(args)?;
    let host = normalize_host(target);
    (!host.is_empty()).then_some(host)
}

fn is_ssh_command(program: &str) -> bool {
    let basename = program.rsplit('/').next().unwrap_or(program);
    SSH_COMMANDS.contains(&basename)
}

/// First argument that is neither an option nor an option's value.
fn first_positional<S: AsRef<str>>(args: &[S]) -> Option<&str> {
    let mut iter = args.iter().map(|arg| arg.as_ref());

    while let Some(arg) = iter.next() {
        if arg == "--" {
            return iter.next();
        }
        if !arg.starts_with('-') {
            return Some(arg);
        }
        if OPTIONS_WITH_ARG.contains(&arg) {
            // Value is the next token.
            iter.next();
        }
        // Anything else (`-v`, `-i/path/key`, `-p22`) stands alone.
    }

    None
}

/// Strip `user@`, IPv6 brackets and `:port`, then lowercase.
fn normalize_host(target: &str) -> String {
    let host = match target.split_once('@') {
        Some((_, rest)) => rest,
        None => target,
    }
    .trim();

    let host = if let Some(inner) = host.strip_prefix('[') {
        match inner.find(']') {
            Some(end) => &inner[..end],
            None => inner,
        }
    } else {
        match host.split_once(':') {
            Some((name, _port)) => name,
            None => host,
        }
    };

    host.to_lowercase()
}

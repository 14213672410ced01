//! Golden tests: every `tests/suite/*.lisp` file is evaluated form by form and the rendered
//! results are compared with the sibling `.expect` file. A missing `.expect` file is written from
//! the current output.

use std::fmt::Write;
use std::fs::{self, read_to_string};
use std::path::{Path, PathBuf};

use zylisp::{EnvOptions, Environment};

fn run(code: &str, file_name: &str, root: &Path) -> String {
    let mut result = String::new();

    let mut env = Environment::with_options(EnvOptions {
        include_root: root.to_path_buf(),
        ..EnvOptions::default()
    });

    let exprs = match env.read(code, Some(file_name.into())) {
        Ok(exprs) => exprs,
        Err(err) => return format!("read error: {err}\n"),
    };

    for expr in exprs {
        match env.eval(&expr) {
            Ok(res) => writeln!(&mut result, "ok: {res}").unwrap(),
            Err(err) => writeln!(&mut result, "error: {err}").unwrap(),
        }
    }

    result
}

fn suite_files(directory: &Path) -> Vec<PathBuf> {
    let mut files = fs::read_dir(directory)
        .unwrap()
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "lisp"))
        .collect::<Vec<_>>();
    files.sort();
    files
}

#[test]
fn suite() {
    let directory = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/suite");
    let mut failures = Vec::new();

    for path in suite_files(&directory) {
        let file_name = path.file_name().unwrap().to_string_lossy().to_string();
        println!("testing '{file_name}'");

        let code = read_to_string(&path).unwrap();
        let result = run(&code, &file_name, &directory);

        let expect = path.with_extension("expect");
        match read_to_string(&expect) {
            Ok(expects) if expects == result => {}
            Ok(expects) => {
                println!("Expected:\n\n{expects}\n\ngot:\n\n{result}");
                failures.push(file_name);
            }
            Err(_) => fs::write(&expect, result).unwrap(),
        }
    }

    assert!(failures.is_empty(), "mismatched suite files: {failures:?}");
}

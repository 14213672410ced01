use std::fs;

use zylisp::{CompileError, EnvOptions, Environment, Error, RuntimeError, Value};

fn eval(env: &mut Environment, source: &str) -> Value {
    match env.eval_str(source) {
        Ok(value) => value,
        Err(err) => panic!("evaluating {source}: {err}"),
    }
}

fn show(source: &str) -> String {
    eval(&mut Environment::new(), source).to_string()
}

#[test]
fn literals_evaluate_to_themselves() {
    assert_eq!(show("42"), "42");
    assert_eq!(show("-7"), "-7");
    assert_eq!(show("2.5"), "2.5");
    assert_eq!(show("\"hi\\n\""), "\"hi\\n\"");
    assert_eq!(show("#a"), "#a");
    assert_eq!(show("true"), "true");
    assert_eq!(show("nil"), "nil");
    assert_eq!(show("[1 [2 3] \"x\"]"), "[1 [2 3] \"x\"]");
}

#[test]
fn quoted_data_prints_as_read() {
    assert_eq!(show("'(a (b c) [1 2])"), "(a (b c) [1 2])");
    assert_eq!(show("(quote sym)"), "sym");
}

#[test]
fn cond_picks_the_first_truthy_clause() {
    let mut env = Environment::new();
    eval(&mut env, "(defn sign [n] (cond (< n 0) 'neg (== n 0) 'zero 'pos))");

    assert_eq!(eval(&mut env, "(sign -3)").to_string(), "neg");
    assert_eq!(eval(&mut env, "(sign 0)").to_string(), "zero");
    assert_eq!(eval(&mut env, "(sign 9)").to_string(), "pos");
    assert_eq!(eval(&mut env, "(cond 0 'zero-is-truthy 'no)").to_string(), "zero-is-truthy");
}

#[test]
fn cond_without_default_is_rejected() {
    let mut env = Environment::new();
    match env.eval_str("(cond true 1)") {
        Err(Error::Compile(err)) => assert!(matches!(err.root(), CompileError::MissingDefault)),
        other => panic!("expected a compile error, got {other:?}"),
    }
}

#[test]
fn and_or_short_circuit() {
    let mut env = Environment::new();
    eval(&mut env, "(def hits 0)");
    eval(&mut env, "(defn touch [v] (set hits (+ hits 1)) v)");

    assert_eq!(eval(&mut env, "(and (touch 1) (touch false) (touch 3))"), Value::Bool(false));
    assert_eq!(eval(&mut env, "hits"), Value::Int(2));

    assert_eq!(eval(&mut env, "(or (touch nil) (touch 5) (touch 6))"), Value::Int(5));
    assert_eq!(eval(&mut env, "hits"), Value::Int(4));

    assert_eq!(eval(&mut env, "(and 1 2 3)"), Value::Int(3));
    assert_eq!(eval(&mut env, "(and)"), Value::Bool(true));
    assert_eq!(eval(&mut env, "(or)"), Value::Bool(false));
}

#[test]
fn let_evaluates_initializers_in_the_outer_scope() {
    let mut env = Environment::new();
    eval(&mut env, "(def x 1)");

    assert_eq!(eval(&mut env, "(let [x 10 y x] y)"), Value::Int(1));
    assert_eq!(eval(&mut env, "(let* [x 10 y x] y)"), Value::Int(10));
    assert_eq!(eval(&mut env, "x"), Value::Int(1));

    assert!(matches!(
        env.eval_str("(let [a 1 b (+ a 1)] b)"),
        Err(Error::Runtime(RuntimeError::UnboundSymbol(_)))
    ));
    assert_eq!(eval(&mut env, "(let* [a 1 b (+ a 1)] b)"), Value::Int(2));
}

#[test]
fn closures_capture_their_scope() {
    let mut env = Environment::new();
    eval(&mut env, "(defn adder [n] (fn [x] (+ x n)))");
    eval(&mut env, "(def add5 (adder 5))");

    assert_eq!(eval(&mut env, "(add5 10)"), Value::Int(15));
    assert_eq!(eval(&mut env, "((adder 1) 1)"), Value::Int(2));
}

#[test]
fn for_loops_collect_and_honour_break_and_continue() {
    let mut env = Environment::new();
    let source = r#"
        (def out [])
        (for [(def i 0) (< i 10) (set i (+ i 1))]
          (cond (== i 2) (continue)
                (== i 5) (break)
                (set out (append out i))))
        out
    "#;

    assert_eq!(eval(&mut env, source).to_string(), "[0 1 3 4]");
}

#[test]
fn nested_loops_break_only_the_inner_one() {
    let mut env = Environment::new();
    let source = r#"
        (def pairs 0)
        (for [(def i 0) (< i 3) (set i (+ i 1))]
          (for [(def j 0) true (set j (+ j 1))]
            (cond (== j 2) (break) (set pairs (+ pairs 1)))))
        pairs
    "#;

    assert_eq!(eval(&mut env, source), Value::Int(6));
}

#[test]
fn break_and_continue_leave_an_enclosing_let() {
    let mut env = Environment::new();
    let source = r#"
        (def acc 0)
        (for [(def i 0) (< i 10) (set i (+ i 1))]
          (let [x i]
            (cond (== x 2) (continue)
                  (== x 5) (break)
                  (set acc (+ acc x)))))
        acc
    "#;

    assert_eq!(eval(&mut env, source), Value::Int(8));
    assert!(matches!(env.eval_str("x"), Err(Error::Runtime(RuntimeError::UnboundSymbol(_)))));
}

#[test]
fn loops_used_as_values_keep_the_stack_balanced() {
    let mut env = Environment::new();

    assert_eq!(
        eval(
            &mut env,
            "(list 1 (for [(def i 0) true (set i (+ i 1))] (let [x 1] (break))) 2)"
        )
        .to_string(),
        "(1 nil 2)"
    );
    assert_eq!(
        eval(
            &mut env,
            "(list 1 (for [(def j 0) (< j 3) (set j (+ j 1))] (let [y j] (continue))) 2)"
        )
        .to_string(),
        "(1 nil 2)"
    );
    assert_eq!(eval(&mut env, "j"), Value::Int(3));
}

#[test]
fn for_evaluates_to_nil() {
    assert_eq!(show("(for [(def i 0) (< i 3) (set i (+ i 1))] i)"), "nil");
}

#[test]
fn break_outside_a_loop_is_a_compile_error() {
    let mut env = Environment::new();
    match env.eval_str("(break)") {
        Err(Error::Compile(err)) => {
            assert!(matches!(err.root(), CompileError::OutsideLoop("break")))
        }
        other => panic!("expected a compile error, got {other:?}"),
    }
}

#[test]
fn self_tail_calls_run_in_constant_space() {
    let mut env = Environment::with_options(EnvOptions {
        max_depth: 100,
        ..EnvOptions::default()
    });

    eval(
        &mut env,
        "(defn count [n acc] (cond (== n 0) acc (count (- n 1) (+ acc 1))))",
    );
    assert_eq!(eval(&mut env, "(count 100000 0)"), Value::Int(100000));
}

#[test]
fn deep_non_tail_recursion_overflows() {
    let mut env = Environment::with_options(EnvOptions {
        max_depth: 50,
        ..EnvOptions::default()
    });

    eval(&mut env, "(defn down [n] (cond (== n 0) 0 (+ 1 (down (- n 1)))))");
    assert_eq!(eval(&mut env, "(down 10)"), Value::Int(10));

    match env.eval_str("(down 1000)") {
        Err(Error::Runtime(RuntimeError::StackOverflow(50))) => {}
        other => panic!("expected a stack overflow, got {other:?}"),
    }

    assert_eq!(eval(&mut env, "(down 3)"), Value::Int(3));
}

#[test]
fn syntax_quote_splices_values() {
    let mut env = Environment::new();
    eval(&mut env, "(def b 3)");
    eval(&mut env, "(def xs (list 1 2))");

    assert_eq!(eval(&mut env, "`(a ~b c)").to_string(), "(a 3 c)");
    assert_eq!(eval(&mut env, "`(x ~@xs y)").to_string(), "(x 1 2 y)");
    assert_eq!(eval(&mut env, "`[~b ~@xs]").to_string(), "[3 1 2]");
    assert_eq!(eval(&mut env, "`(a (b ~b))").to_string(), "(a (b 3))");
}

#[test]
fn syntax_quote_without_unquote_matches_quote() {
    assert_eq!(show("(== `(a (b c) 1) '(a (b c) 1))"), "true");
}

#[test]
fn macros_expand_at_compile_time() {
    let mut env = Environment::new();
    eval(
        &mut env,
        "(defmac unless [c body] `(cond ~c nil ~body))",
    );

    assert_eq!(eval(&mut env, "(unless false 7)"), Value::Int(7));
    assert_eq!(eval(&mut env, "(unless true 7)"), Value::Null);
    assert_eq!(
        eval(&mut env, "(macexpand (unless x y))").to_string(),
        "(cond x nil y)"
    );
}

#[test]
fn macro_expansion_does_not_leak_globals() {
    let mut env = Environment::new();
    eval(&mut env, "(def counter 0)");
    eval(
        &mut env,
        "(defmac leaky [] (set counter 99) `(quote done))",
    );

    assert_eq!(eval(&mut env, "(leaky)").to_string(), "done");
    assert_eq!(eval(&mut env, "counter"), Value::Int(0));
    assert_eq!(eval(&mut env, "(macexpand (leaky))").to_string(), "(quote done)");
    assert_eq!(eval(&mut env, "counter"), Value::Int(0));
}

#[test]
fn macros_calling_existing_functions_do_not_leak_globals() {
    let mut env = Environment::new();
    eval(&mut env, "(def n 0)");
    eval(&mut env, "(defn bump [] (set n (+ n 1)) n)");
    eval(&mut env, "(defmac m [] (bump) (quote 1))");

    assert_eq!(eval(&mut env, "(m)"), Value::Int(1));
    assert_eq!(eval(&mut env, "n"), Value::Int(0));

    assert_eq!(eval(&mut env, "(bump)"), Value::Int(1));
    assert_eq!(eval(&mut env, "n"), Value::Int(1));
}

#[test]
fn binding_a_macro_name_is_rejected() {
    let mut env = Environment::new();
    eval(&mut env, "(defmac m [] 1)");

    match env.eval_str("(def m 2)") {
        Err(Error::Compile(err)) => assert!(matches!(err.root(), CompileError::MacroNameClash(_))),
        other => panic!("expected a compile error, got {other:?}"),
    }
}

#[test]
fn hashes_store_and_retrieve() {
    let mut env = Environment::new();
    eval(&mut env, "(def h {\"a\" 1 'b [2]})");

    assert_eq!(eval(&mut env, "(hget h \"a\")"), Value::Int(1));
    assert_eq!(eval(&mut env, "(hget h 'b)").to_string(), "[2]");

    eval(&mut env, "(hset h 3 'three)");
    assert_eq!(eval(&mut env, "(hget h 3)").to_string(), "three");
    assert_eq!(eval(&mut env, "(len h)"), Value::Int(3));

    eval(&mut env, "(hdel h \"a\")");
    eval(&mut env, "(hdel h \"a\")");
    assert_eq!(eval(&mut env, "(len h)"), Value::Int(2));
}

#[test]
fn mdef_binds_positionally() {
    let mut env = Environment::new();
    eval(&mut env, "(mdef a 'b c (list 1 2 3))");

    assert_eq!(eval(&mut env, "(list a b c)").to_string(), "(1 2 3)");
    match env.eval_str("(mdef x y (list 1))") {
        Err(Error::Runtime(RuntimeError::Destructure { expected: 2, got: 1 })) => {}
        other => panic!("expected a destructuring error, got {other:?}"),
    }
}

#[test]
fn assert_raises_with_the_failing_form() {
    let mut env = Environment::new();
    assert_eq!(eval(&mut env, "(assert (== 1 1))"), Value::Null);

    match env.eval_str("(assert (== 1 2))") {
        Err(Error::Runtime(RuntimeError::AssertionFailed(form))) => assert_eq!(form, "(== 1 2)"),
        other => panic!("expected an assertion failure, got {other:?}"),
    }
}

#[test]
fn long_lists_compare_and_drop() {
    let mut env = Environment::new();
    eval(
        &mut env,
        "(def l nil) (for [(def i 0) (< i 300000) (set i (+ i 1))] (set l (cons i l)))",
    );

    assert_eq!(eval(&mut env, "(len l)"), Value::Int(300000));
    assert_eq!(eval(&mut env, "(== l l)"), Value::Bool(true));
    assert_eq!(eval(&mut env, "(== l (cons 1 l))"), Value::Bool(false));
    assert_eq!(eval(&mut env, "(set l nil)"), Value::Null);
    assert_eq!(eval(&mut env, "l"), Value::Null);
}

#[test]
fn variadic_functions_collect_extra_arguments() {
    let mut env = Environment::new();
    eval(&mut env, "(defn tail-of [a & rest] rest)");

    assert_eq!(eval(&mut env, "(tail-of 1 2 3)").to_string(), "(2 3)");
    assert_eq!(eval(&mut env, "(tail-of 1)"), Value::Null);
}

#[test]
fn include_reads_files_relative_to_the_root() {
    let root = std::env::temp_dir().join(format!("zylisp-include-{}", std::process::id()));
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("lib.zy"), "(defn twice [x] (* 2 x)) (def loaded true)").unwrap();
    fs::write(root.join("more.zy"), "(def more (twice 4))").unwrap();

    let mut env = Environment::with_options(EnvOptions {
        include_root: root.clone(),
        ..EnvOptions::default()
    });

    assert_eq!(eval(&mut env, "(include \"lib.zy\")"), Value::Bool(true));
    assert_eq!(eval(&mut env, "(twice 21)"), Value::Int(42));
    assert_eq!(eval(&mut env, "(include [\"more.zy\"])"), Value::Int(8));

    match env.eval_str("(include \"missing.zy\")") {
        Err(Error::Compile(err)) => assert!(matches!(err.root(), CompileError::Include { .. })),
        other => panic!("expected an include error, got {other:?}"),
    }

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn runtime_errors_leave_the_environment_usable() {
    let mut env = Environment::new();
    eval(&mut env, "(def x 1)");

    assert!(env.eval_str("(+ x (undefined-thing))").is_err());
    assert!(env.eval_str("(let [y 2] (/ y 0))").is_err());
    assert_eq!(eval(&mut env, "(+ x 1)"), Value::Int(2));
}

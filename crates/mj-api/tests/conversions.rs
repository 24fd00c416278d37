use std::sync::Arc;

use mj_api::{
    default_arguments, ChtmlArguments, MathJax, MathJaxOptions, MathJaxWorker, MmlArguments,
    SvgArguments, FUNCTIONS, TEX2SVG,
};
use mj_core::{
    AsciiMathInputProcessorOptions, ConversionOptions, FunctionDescriptor, MathJaxError,
    MmlInputProcessorOptions, OutputFormat, TexInputProcessorOptions,
};
use mj_runtime::DirectoryBundleLocator;

fn options(preferred: &[OutputFormat]) -> MathJaxOptions {
    let mut options = MathJaxOptions::new(
        mj_test_fixtures::lockfile_path(),
        Arc::new(DirectoryBundleLocator::new(mj_test_fixtures::bundles_dir())),
    );
    options.preferred_formats = preferred.to_vec();
    options
}

#[test]
fn every_catalog_function_converts_a_batch() {
    let mut mathjax = MathJax::new(options(&[])).expect("instance should build");
    for function in FUNCTIONS.iter() {
        let input = if function.name.starts_with("mml") {
            "<math><mi>x</mi></math>"
        } else {
            "x"
        };
        let extra = default_arguments(function, ConversionOptions::default())
            .expect("default arguments");
        let inputs = vec![input.to_string(); 4];
        let responses = mathjax
            .convert_batch(function, &inputs, &extra)
            .expect("batch should dispatch");
        assert_eq!(responses.len(), 4, "{}", function.name);
        assert!(
            responses.iter().all(|response| response.is_ok()),
            "{} returned {:?}",
            function.name,
            responses
        );
    }
    assert_eq!(mathjax.loaded_formats(), OutputFormat::ALL.to_vec());
}

#[test]
fn preferred_format_does_not_block_other_formats() {
    let mut mathjax = MathJax::new(options(&[OutputFormat::Chtml])).expect("instance should build");
    assert_eq!(mathjax.loaded_formats(), vec![OutputFormat::Chtml]);

    let chtml = mathjax
        .am2chtml("a/b", &ChtmlArguments::default(), &AsciiMathInputProcessorOptions::default())
        .expect("am2chtml");
    assert!(chtml.contains("a/b"));

    let mml = mathjax
        .am2mml("a/b", &MmlArguments::default(), &AsciiMathInputProcessorOptions::default())
        .expect("am2mml");
    assert!(mml.contains("displaystyle=\"true\""));
    assert_eq!(
        mathjax.loaded_formats(),
        vec![OutputFormat::Chtml, OutputFormat::Mml]
    );
}

#[test]
fn escaped_markup_survives_the_round_trip() {
    let mut mathjax = MathJax::new(options(&[])).expect("instance should build");
    let output = mathjax
        .tex2chtml("a<b", &ChtmlArguments::default(), &TexInputProcessorOptions::default())
        .expect("tex2chtml");
    assert!(output.contains("a&lt;b"));
}

#[test]
fn assistive_mml_and_styles_are_forwarded() {
    let mut mathjax = MathJax::new(options(&[])).expect("instance should build");
    let arguments = SvgArguments {
        css: true,
        assistive_mml: true,
        container: true,
        ..SvgArguments::default()
    };
    let output = mathjax
        .mml2svg(
            "<math><mi>x</mi></math>",
            &arguments,
            &MmlInputProcessorOptions::default(),
        )
        .expect("mml2svg");
    assert!(output.contains("<mjx-assistive-mml>"));
    assert!(output.contains("MJX-SVG-styles"));

    let error = mathjax
        .mml2chtml(
            "plain",
            &ChtmlArguments::default(),
            &MmlInputProcessorOptions::default(),
        )
        .expect_err("non-MathML should fail");
    assert_eq!(error.code(), "MJ_CONVERSION_FAILED");
}

#[test]
fn version_mismatch_stops_construction() {
    let mut options = options(&OutputFormat::ALL);
    options.lockfile_path = mj_test_fixtures::mismatched_lockfile_path();
    let error = MathJax::new(options).err().expect("construction should fail");
    assert_eq!(
        error,
        MathJaxError::VersionMismatch {
            expected: "3.2.2".to_string(),
            found: "3.0.0".to_string(),
        }
    );
    assert!(error.is_fatal());
}

#[test]
fn unregistered_module_leaves_instance_usable() {
    let mut mathjax = MathJax::new(options(&[OutputFormat::Svg])).expect("instance should build");
    let orphan = FunctionDescriptor {
        module_name: "PDF",
        ..TEX2SVG
    };
    let extra = default_arguments(&orphan, ConversionOptions::default()).expect("arguments");
    assert_eq!(
        mathjax.convert(&orphan, "x", &extra),
        Err(MathJaxError::MissingModule("PDF".to_string()))
    );
    assert!(mathjax.convert(&TEX2SVG, "x", &extra).is_ok());
}

#[tokio::test]
async fn worker_serves_concurrent_callers() {
    let worker = MathJaxWorker::spawn(options(&[])).await.expect("worker should start");
    let tasks = (0..8)
        .map(|index| {
            let worker = worker.clone();
            tokio::spawn(async move {
                worker
                    .tex2mml(
                        format!("x{}", index),
                        MmlArguments::default(),
                        TexInputProcessorOptions::default(),
                    )
                    .await
            })
        })
        .collect::<Vec<_>>();

    for (index, task) in tasks.into_iter().enumerate() {
        let output = task
            .await
            .expect("task should join")
            .expect("conversion should succeed");
        assert!(output.contains(&format!("<mi>x{}</mi>", index)));
    }
}

#[tokio::test]
async fn dropped_worker_rejects_pending_work() {
    let worker = MathJaxWorker::spawn(options(&[])).await.expect("worker should start");
    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
    let blocker = worker.submit(move |_: &mut MathJax| {
        let _ = release_rx.recv();
        Ok::<_, MathJaxError>(())
    });
    let pending = worker.submit(|mathjax: &mut MathJax| {
        mathjax.tex2svg("x", &SvgArguments::default(), &TexInputProcessorOptions::default())
    });
    drop(worker);
    let _ = release_tx.send(());

    let _ = blocker.await;
    assert_eq!(pending.await, Err(MathJaxError::InstanceDeallocated));
}

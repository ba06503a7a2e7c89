use anyhow::Result;
use fastembed::{
    read_file_to_bytes, EmbeddingModel, InitOptions, InitOptionsUserDefined, Pooling,
    TextEmbedding, TokenizerFiles, UserDefinedEmbeddingModel,
};
use std::path::Path;

/// Load the local embedding model.
///
/// With `model_dir` set, loads a user-defined ONNX export laid out as
/// `onnx/model.onnx` plus the tokenizer json files; otherwise downloads
/// bge-large-en-v1.5 (1024 dimensions) into the fastembed cache.
pub fn get_model(model_dir: Option<&Path>) -> Result<TextEmbedding> {
    let Some(base_path) = model_dir else {
        tracing::info!("loading fastembed model {:?}", EmbeddingModel::BGELargeENV15);
        return TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::BGELargeENV15).with_show_download_progress(false),
        );
    };

    tracing::info!("loading user-defined embedding model from {}", base_path.display());
    let onnx_bytes = read_file_to_bytes(&base_path.join("onnx").join("model.onnx"))?;
    let tokenizer_files = TokenizerFiles {
        tokenizer_file: read_file_to_bytes(&base_path.join("tokenizer.json"))?,
        config_file: read_file_to_bytes(&base_path.join("config.json"))?,
        special_tokens_map_file: read_file_to_bytes(&base_path.join("special_tokens_map.json"))?,
        tokenizer_config_file: read_file_to_bytes(&base_path.join("tokenizer_config.json"))?,
    };

    let user_model =
        UserDefinedEmbeddingModel::new(onnx_bytes, tokenizer_files).with_pooling(Pooling::Cls);

    TextEmbedding::try_new_from_user_defined(user_model, InitOptionsUserDefined::default())
}
